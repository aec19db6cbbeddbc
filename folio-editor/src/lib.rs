//! # folio-editor — the open-document session
//!
//! `EditorSession` is the single source of truth for one open document.
//! It owns the page list, the computed content budget, and the wiring
//! between the three concerns the lower crates keep separate:
//!
//! ```text
//! edit lands on a page ──► session marks the page dirty
//!                          │
//! layout settles ─────────►│ reflow cascade (folio-layout)
//!                          │
//!                          └──► canonical document enqueued
//!                               (folio-persist SaveQueue)
//! ```
//!
//! There is no ambient global state: a host constructs the session
//! explicitly from a gateway, a save queue, and a measurement oracle, and
//! passes it by reference to whatever state propagation it prefers.

pub mod session;

pub use session::{EditorSession, SessionError};
