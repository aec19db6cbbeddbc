//! Incremental overflow detection and the forward reflow cascade.
//!
//! Re-measuring and re-splitting the whole document on every keystroke is
//! unacceptable latency. After a local edit only the edited page can have
//! grown, so only it is re-evaluated; when it overflows, the minimal
//! contiguous run of trailing nodes migrates to the next page and the
//! check cascades forward until the tail settles.

use crate::measure::{LayoutError, MeasurementOracle};
use folio_core::{BlockNode, ContentModel, Page};

/// The two partitions of an overflowing page.
#[derive(Debug, Clone, PartialEq)]
pub struct OverflowSplit {
    /// Nodes that stay on the page, in order.
    pub keep: Vec<BlockNode>,
    /// The minimal contiguous trailing run that must move to the next page.
    pub overflow: Vec<BlockNode>,
}

/// Check one page against its budget.
///
/// Returns `Ok(None)` when the page fits. Otherwise nodes are peeled off
/// the tail, one at a time, until what remains fits: the peeled suffix is
/// the minimal trailing run whose removal brings the page within budget.
/// A node ending exactly at the boundary is kept, not pushed — overflow
/// only contains nodes strictly beyond the budget. `keep` never empties:
/// an oversized head node stays alone on the page.
///
/// The caller owns moving `overflow` onto the following page and
/// re-running the check there — see [`reflow_from`].
pub fn detect_overflow(
    page: &Page,
    budget: f64,
    oracle: &dyn MeasurementOracle,
) -> Result<Option<OverflowSplit>, LayoutError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(LayoutError::DegenerateBudget(budget));
    }
    if page.content.is_empty() {
        return Ok(None);
    }

    let extent = oracle
        .page_extent(page)
        .ok_or(LayoutError::PageMeasurementUnavailable(page.index))?;
    if extent <= budget {
        return Ok(None);
    }

    let nodes = page.content.nodes();
    let mut heights = Vec::with_capacity(nodes.len());
    for node in nodes {
        let h = oracle
            .node_height(node)
            .ok_or(LayoutError::MeasurementUnavailable(node.id))?;
        heights.push(h);
    }

    let mut total: f64 = heights.iter().sum();
    let mut cut = heights.len();
    while cut > 1 && total > budget {
        cut -= 1;
        total -= heights[cut];
    }

    if cut == heights.len() {
        // Every node fits by its own height; the extent overshoot comes
        // from host spacing. Nothing is strictly beyond budget.
        return Ok(None);
    }

    log::debug!(
        "page {} over budget ({extent:.1}/{budget:.1}): keeping {cut} of {} nodes",
        page.index,
        heights.len()
    );

    Ok(Some(OverflowSplit {
        keep: nodes[..cut].to_vec(),
        overflow: nodes[cut..].to_vec(),
    }))
}

/// Cascade overflow forward from the page at `start`.
///
/// Each overflowing page keeps its fitting prefix; the trailing run is
/// prepended onto the following page (created lazily at the tail), which
/// is then re-checked — a single edit can overflow more than one page,
/// e.g. pasting a large block. The cascade stops at the first page that
/// fits, since pages after it were not touched.
///
/// Returns whether any node moved.
pub fn reflow_from(
    pages: &mut Vec<Page>,
    start: usize,
    budget: f64,
    oracle: &dyn MeasurementOracle,
) -> Result<bool, LayoutError> {
    let mut moved = false;
    let mut i = start;

    while i < pages.len() {
        match detect_overflow(&pages[i], budget, oracle)? {
            Some(OverflowSplit { keep, overflow }) => {
                moved = true;
                pages[i].content = ContentModel::from_nodes(keep);
                if i + 1 == pages.len() {
                    pages.push(Page::new(i + 1, budget));
                }
                pages[i + 1].content.prepend(overflow);
                i += 1;
            }
            // This page fits, so nothing spilled downstream of it.
            None => break,
        }
    }

    if moved {
        log::debug!("reflow from page {start} settled at {} pages", pages.len());
    }
    Ok(moved)
}

/// The append-biased fast path: re-check only the last page.
pub fn reflow_trailing(
    pages: &mut Vec<Page>,
    budget: f64,
    oracle: &dyn MeasurementOracle,
) -> Result<bool, LayoutError> {
    let last = pages.len().saturating_sub(1);
    reflow_from(pages, last, budget, oracle)
}
