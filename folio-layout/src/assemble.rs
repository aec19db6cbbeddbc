//! Reassembly — the inverse of pagination.

use folio_core::{ContentModel, Page};

/// Join page fragments back into one canonical document.
///
/// Concatenates each page's nodes in page-index order. No node is
/// duplicated or dropped: pagination is a lossless, reversible view over
/// one logical document, and this function is the invariant's keeper —
/// `assemble(paginate(doc, budget, oracle)) == doc` for any positive
/// budget and any oracle reporting finite positive heights.
pub fn assemble(pages: &[Page]) -> ContentModel {
    debug_assert!(
        pages.windows(2).all(|w| w[0].index < w[1].index),
        "pages out of index order"
    );

    let mut doc = ContentModel::new();
    for page in pages {
        doc.extend(page.content.iter().cloned());
    }
    doc
}

/// Restore the page-list invariants after an edit pass.
///
/// Drops pages emptied by deletions (keeping one page even for an empty
/// document), reassigns contiguous indexes in reading order, and stamps
/// the current budget onto every page.
pub fn renumber(pages: &mut Vec<Page>, budget: f64) {
    pages.retain(|p| !p.is_empty());
    if pages.is_empty() {
        pages.push(Page::new(0, budget));
        return;
    }
    for (i, page) in pages.iter_mut().enumerate() {
        page.index = i;
        page.height_budget = budget;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::FixedMeasure;
    use crate::paginate::paginate;
    use folio_core::BlockNode;

    fn doc_of(n: usize) -> (ContentModel, FixedMeasure) {
        let mut oracle = FixedMeasure::new();
        let nodes: Vec<BlockNode> = (0..n)
            .map(|i| {
                let node = BlockNode::paragraph(format!("node {i}"));
                // Vary heights so page boundaries land unevenly.
                oracle.set(node.id, 20.0 + (i % 7) as f64 * 17.0);
                node
            })
            .collect();
        (ContentModel::from_nodes(nodes), oracle)
    }

    #[test]
    fn test_assemble_empty_pages() {
        let pages = vec![Page::new(0, 100.0)];
        assert!(assemble(&pages).is_empty());
    }

    #[test]
    fn test_roundtrip_law_across_budgets() {
        let (doc, oracle) = doc_of(40);
        for budget in [25.0, 64.0, 120.0, 333.0, 10_000.0] {
            let pages = paginate(&doc, budget, &oracle).unwrap();
            assert_eq!(
                assemble(&pages),
                doc,
                "round-trip violated at budget {budget}"
            );
        }
    }

    #[test]
    fn test_assemble_preserves_order_and_count() {
        let (doc, oracle) = doc_of(15);
        let pages = paginate(&doc, 100.0, &oracle).unwrap();
        let back = assemble(&pages);

        assert_eq!(back.len(), doc.len());
        for (a, b) in back.iter().zip(doc.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn test_renumber_drops_empty_pages() {
        let node = BlockNode::paragraph("x");
        let mut pages = vec![
            Page::new(0, 100.0),
            Page::with_content(1, ContentModel::from_nodes(vec![node]), 100.0),
            Page::new(2, 100.0),
        ];
        renumber(&mut pages, 100.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].index, 0);
        assert_eq!(pages[0].node_count(), 1);
    }

    #[test]
    fn test_renumber_keeps_one_page_when_all_empty() {
        let mut pages = vec![Page::new(0, 100.0), Page::new(1, 100.0)];
        renumber(&mut pages, 80.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].index, 0);
        assert!((pages[0].height_budget - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_renumber_stamps_new_budget() {
        let (doc, oracle) = doc_of(6);
        let mut pages = paginate(&doc, 100.0, &oracle).unwrap();
        renumber(&mut pages, 250.0);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index, i);
            assert!((page.height_budget - 250.0).abs() < f64::EPSILON);
        }
    }
}
