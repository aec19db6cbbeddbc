//! Full pagination — split a document into budget-sized pages.

use crate::measure::{LayoutError, MeasurementOracle};
use folio_core::{ContentModel, Page};

/// Split `doc` into pages whose content fits `budget`.
///
/// Pure function over the oracle's measurements: walks nodes in order,
/// accumulating heights into the current page, and closes the page when
/// the next node would exceed the budget and the page already holds at
/// least one node. A single node taller than the whole budget is placed
/// alone on its own page; splitting inside an opaque node is out of scope.
///
/// Always returns at least one page; an empty document paginates to one
/// empty page. The concatenation of the returned pages in index order is
/// exactly `doc`.
pub fn paginate(
    doc: &ContentModel,
    budget: f64,
    oracle: &dyn MeasurementOracle,
) -> Result<Vec<Page>, LayoutError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(LayoutError::DegenerateBudget(budget));
    }

    let mut pages: Vec<Page> = Vec::new();
    let mut current = Page::new(0, budget);
    let mut current_height = 0.0;

    for node in doc.iter() {
        let height = oracle
            .node_height(node)
            .ok_or(LayoutError::MeasurementUnavailable(node.id))?;

        if current_height + height > budget && !current.is_empty() {
            log::trace!(
                "closing page {} at {current_height:.1}/{budget:.1}",
                current.index
            );
            let next = Page::new(current.index + 1, budget);
            pages.push(std::mem::replace(&mut current, next));
            current_height = 0.0;
        }

        current.content.push(node.clone());
        current_height += height;
    }
    pages.push(current);

    log::debug!("paginated {} nodes into {} pages", doc.len(), pages.len());
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::measure::FixedMeasure;
    use folio_core::BlockNode;

    /// Build a document plus an oracle reporting the given heights.
    fn doc_with_heights(heights: &[f64]) -> (ContentModel, FixedMeasure) {
        let mut oracle = FixedMeasure::new();
        let nodes: Vec<BlockNode> = heights
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let node = BlockNode::paragraph(format!("node {i}"));
                oracle.set(node.id, *h);
                node
            })
            .collect();
        (ContentModel::from_nodes(nodes), oracle)
    }

    fn page_heights(page: &Page, oracle: &FixedMeasure) -> Vec<f64> {
        page.content
            .iter()
            .map(|n| oracle.node_height(n).unwrap())
            .collect()
    }

    #[test]
    fn test_three_fifties_at_budget_120_split_two_one() {
        let (doc, oracle) = doc_with_heights(&[50.0, 50.0, 50.0]);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(page_heights(&pages[0], &oracle), vec![50.0, 50.0]);
        assert_eq!(page_heights(&pages[1], &oracle), vec![50.0]);
    }

    #[test]
    fn test_empty_document_yields_one_empty_page() {
        let doc = ContentModel::new();
        let pages = paginate(&doc, 100.0, &FixedMeasure::new()).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
        assert_eq!(pages[0].index, 0);
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        // 60 + 60 == 120: the boundary node is kept, not pushed.
        let (doc, oracle) = doc_with_heights(&[60.0, 60.0]);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].node_count(), 2);
    }

    #[test]
    fn test_oversized_node_gets_own_page() {
        let (doc, oracle) = doc_with_heights(&[50.0, 300.0, 50.0]);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(page_heights(&pages[0], &oracle), vec![50.0]);
        assert_eq!(page_heights(&pages[1], &oracle), vec![300.0]);
        assert_eq!(page_heights(&pages[2], &oracle), vec![50.0]);
    }

    #[test]
    fn test_oversized_first_node_not_retried() {
        let (doc, oracle) = doc_with_heights(&[500.0]);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].node_count(), 1);
    }

    #[test]
    fn test_budget_respected_except_oversized_pages() {
        let heights = [30.0, 80.0, 45.0, 200.0, 10.0, 10.0, 10.0, 119.0, 2.0];
        let (doc, oracle) = doc_with_heights(&heights);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();

        for page in &pages {
            let extent: f64 = page_heights(page, &oracle).iter().sum();
            if page.node_count() > 1 {
                assert!(extent <= 120.0, "page {} exceeds budget: {extent}", page.index);
            }
        }
    }

    #[test]
    fn test_roundtrip_law() {
        let heights = [12.0, 200.0, 33.3, 90.0, 90.0, 1.0, 56.0, 119.9, 120.0, 0.1];
        let (doc, oracle) = doc_with_heights(&heights);

        for budget in [1.0, 60.0, 120.0, 1000.0] {
            let pages = paginate(&doc, budget, &oracle).unwrap();
            assert_eq!(assemble(&pages), doc, "round-trip failed at budget {budget}");
        }
    }

    #[test]
    fn test_pages_are_contiguous_and_indexed() {
        let (doc, oracle) = doc_with_heights(&[50.0; 10]);
        let pages = paginate(&doc, 120.0, &oracle).unwrap();
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert!((page.height_budget - 120.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_degenerate_budget_rejected() {
        let (doc, oracle) = doc_with_heights(&[50.0]);
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = paginate(&doc, bad, &oracle);
            assert!(
                matches!(result, Err(LayoutError::DegenerateBudget(_))),
                "budget {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_unsettled_measurement_defers() {
        let known = BlockNode::paragraph("a");
        let unknown = BlockNode::paragraph("b");
        let mut oracle = FixedMeasure::new();
        oracle.set(known.id, 30.0);
        let unknown_id = unknown.id;

        let doc = ContentModel::from_nodes(vec![known, unknown]);
        match paginate(&doc, 120.0, &oracle) {
            Err(LayoutError::MeasurementUnavailable(id)) => assert_eq!(id, unknown_id),
            other => panic!("expected MeasurementUnavailable, got {other:?}"),
        }
    }
}
