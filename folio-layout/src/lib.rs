//! # folio-layout — pagination engine for the Folio document editor
//!
//! Splits a flat document into page fragments that fit a fixed
//! content-height budget, keeps the page list consistent as edits land,
//! and reassembles the fragments back into the canonical document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   paginate    ┌───────────────┐
//! │ ContentModel │ ────────────► │ Page 0..n     │
//! │ (canonical)  │ ◄──────────── │ (fragments)   │
//! └──────────────┘   assemble    └───────┬───────┘
//!                                        │ edit lands on a page
//!                                        ▼
//!                               ┌────────────────┐
//!                               │ detect_overflow│──► minimal trailing
//!                               │ + reflow_from  │    run migrates to
//!                               └────────────────┘    the next page
//! ```
//!
//! Heights come from a [`MeasurementOracle`] the host supplies — a browser
//! surface reads rendered-element geometry, a headless host uses a
//! text-metrics engine or the table-driven [`FixedMeasure`]. This crate
//! never computes typography itself; every pass here is a pure function
//! over already-available measurements and completes within one
//! layout-settle tick.
//!
//! ## Modules
//!
//! - [`measure`] — the oracle trait, the table-driven test double, and a
//!   memoizing cache
//! - [`paginate`] — full split of a document into pages
//! - [`overflow`] — incremental re-check of an edited page and the forward
//!   reflow cascade
//! - [`assemble`] — the inverse of pagination

pub mod assemble;
pub mod measure;
pub mod overflow;
pub mod paginate;

// Re-exports for convenience
pub use assemble::{assemble, renumber};
pub use measure::{CachedMeasure, FixedMeasure, LayoutError, MeasurementOracle};
pub use overflow::{detect_overflow, reflow_from, reflow_trailing, OverflowSplit};
pub use paginate::paginate;
