//! # Deck Audit
//!
//! Finds factual and logical inconsistencies across the slides of a
//! presentation using a generative model.
//!
//! Deck Audit extracts the text, tables, and element markers from a `.pptx`
//! deck, splits the combined content into size-bounded chunks, analyzes
//! each chunk with the Gemini API, and reconciles the per-chunk findings
//! into one final report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────────────────┐   ┌─────────┐
//! │ Extract  │──▶│            Pipeline              │──▶│ Report  │
//! │  .pptx   │   │ combine → chunk → analyze →      │   │ (text)  │
//! └──────────┘   │           reconcile              │   └─────────┘
//!                └────────────────┬────────────────┘
//!                                 ▼
//!                          ┌────────────┐
//!                          │   Gemini   │
//!                          │ (retries)  │
//!                          └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! deckaudit analyze quarterly-review.pptx
//! deckaudit analyze quarterly-review.pptx --dry-run   # no model calls
//! deckaudit extract quarterly-review.pptx             # show slide content
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential resolution |
//! | [`models`] | Core data types |
//! | [`extract`] | `.pptx` slide content extraction |
//! | [`chunk`] | Line-boundary text chunking |
//! | [`client`] | Gemini model client with retry/backoff |
//! | [`prompts`] | Analysis and reconciliation prompts |
//! | [`analyzer`] | Per-chunk analysis |
//! | [`reconcile`] | Cross-chunk reconciliation |
//! | [`pipeline`] | Stage orchestration |
//! | [`progress`] | Stderr progress reporting |

pub mod analyzer;
pub mod chunk;
pub mod client;
pub mod config;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reconcile;
