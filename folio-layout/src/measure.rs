//! Measurement oracle — the host-supplied geometry capability.

use folio_core::{BlockNode, Page};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("measurement unavailable for node {0}")]
    MeasurementUnavailable(Uuid),
    #[error("measurement unavailable for page {0}")]
    PageMeasurementUnavailable(usize),
    #[error("content height budget is not positive: {0}")]
    DegenerateBudget(f64),
}

/// Reports the rendered height of document content.
///
/// Implementations must be stable for unchanged content: measuring the
/// same unmodified node twice in the same layout context returns the same
/// value. `None` means layout has not settled yet — callers defer the pass
/// to the next settle tick rather than paginate against a missing height.
pub trait MeasurementOracle {
    /// Occupied height of a single rendered block, in the host's layout unit.
    fn node_height(&self, node: &BlockNode) -> Option<f64>;

    /// Rendered extent of a full page fragment.
    ///
    /// Defaults to the sum of node heights; hosts whose real geometry
    /// includes inter-block spacing should override.
    fn page_extent(&self, page: &Page) -> Option<f64> {
        let mut total = 0.0;
        for node in page.content.nodes() {
            total += self.node_height(node)?;
        }
        Some(total)
    }
}

/// Table-driven oracle with per-node heights and a fallback default.
///
/// The headless implementation, and the fixture every layout test runs
/// against.
#[derive(Debug, Clone, Default)]
pub struct FixedMeasure {
    heights: FxHashMap<Uuid, f64>,
    default_height: Option<f64>,
}

impl FixedMeasure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node not listed individually measures `height`.
    pub fn with_default(height: f64) -> Self {
        Self {
            heights: FxHashMap::default(),
            default_height: Some(height),
        }
    }

    pub fn set(&mut self, id: Uuid, height: f64) {
        self.heights.insert(id, height);
    }

    pub fn remove(&mut self, id: Uuid) {
        self.heights.remove(&id);
    }
}

impl MeasurementOracle for FixedMeasure {
    fn node_height(&self, node: &BlockNode) -> Option<f64> {
        self.heights
            .get(&node.id)
            .copied()
            .or(self.default_height)
    }
}

/// Memoizing wrapper around another oracle.
///
/// Real hosts pay a layout read per measurement; this caches per-node
/// heights across a pass. Single-threaded: the pagination core runs on the
/// UI thread, so interior mutability via `RefCell` is enough. Callers must
/// [`CachedMeasure::invalidate`] a node whenever its content is rewritten.
pub struct CachedMeasure<O> {
    inner: O,
    cache: RefCell<FxHashMap<Uuid, f64>>,
}

impl<O: MeasurementOracle> CachedMeasure<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Drop the cached height for one node (its content changed).
    pub fn invalidate(&self, id: Uuid) {
        self.cache.borrow_mut().remove(&id);
    }

    /// Drop every cached height (layout context changed, e.g. page resize).
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: MeasurementOracle> MeasurementOracle for CachedMeasure<O> {
    fn node_height(&self, node: &BlockNode) -> Option<f64> {
        if let Some(h) = self.cache.borrow().get(&node.id) {
            return Some(*h);
        }
        let h = self.inner.node_height(node)?;
        self.cache.borrow_mut().insert(node.id, h);
        Some(h)
    }

    fn page_extent(&self, page: &Page) -> Option<f64> {
        self.inner.page_extent(page)
    }
}
