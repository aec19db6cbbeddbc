//! # folio-persist — durable persistence for the Folio document editor
//!
//! Coalesces bursts of edits into a minimal, ordered set of durable save
//! operations, without ever losing or duplicating a write.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  enqueue(patch)  ┌─────────────────────────────┐
//! │ EditorSession│ ───────────────► │ SaveQueue                   │
//! │ (per edit)   │                  │                             │
//! └──────────────┘                  │  per document:              │
//!                                   │  Idle → Pending → Flushing  │
//!                                   │   ▲        │ debounce   │   │
//!                                   │   └────────┴── retry ◄──┘   │
//!                                   └──────────────┬──────────────┘
//!                                                  │ merged patch
//!                                                  ▼
//!                                   ┌─────────────────────────────┐
//!                                   │ PersistenceGateway          │
//!                                   │ (host capability)           │
//!                                   └─────────────────────────────┘
//! ```
//!
//! The debounce window is measured from the *last* enqueue, so a
//! continuous edit stream defers saving until the author pauses. At most
//! one flush is in flight per document at any time; a failed flush keeps
//! its payload and retries with bounded exponential backoff.
//!
//! ## Modules
//!
//! - [`patch`] — partial-document payloads and the right-biased shallow
//!   merge that coalesces them
//! - [`gateway`] — the storage capability trait plus an in-memory
//!   reference implementation
//! - [`queue`] — the debounced save queue and its per-document state
//!   machine

pub mod gateway;
pub mod patch;
pub mod queue;

// Re-exports for convenience
pub use gateway::{
    DocumentKind, DocumentRecord, GatewayError, MemoryGateway, PersistenceGateway,
};
pub use patch::DocumentPatch;
pub use queue::{backoff_delay, FlushState, SaveError, SaveEvent, SaveQueue, SaveQueueConfig};
