//! Page fragments — the paginated view over a document.

use crate::model::ContentModel;
use serde::{Deserialize, Serialize};

/// One page of a paginated document.
///
/// `index` order equals reading order. A document always has at least one
/// page, even when empty; the layout crate enforces this when it builds and
/// renumbers the page list. Pages are created lazily as content overflows
/// and never outlive the open document session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub content: ContentModel,
    /// Maximum content height this page may hold, in the host's layout unit.
    pub height_budget: f64,
}

impl Page {
    pub fn new(index: usize, height_budget: f64) -> Self {
        Self {
            index,
            content: ContentModel::new(),
            height_budget,
        }
    }

    pub fn with_content(index: usize, content: ContentModel, height_budget: f64) -> Self {
        Self {
            index,
            content,
            height_budget,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BlockNode;

    #[test]
    fn test_new_page_is_empty() {
        let page = Page::new(0, 960.0);
        assert!(page.is_empty());
        assert_eq!(page.index, 0);
        assert!((page.height_budget - 960.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_content() {
        let content = ContentModel::from_nodes(vec![BlockNode::paragraph("a")]);
        let page = Page::with_content(2, content, 500.0);
        assert_eq!(page.node_count(), 1);
        assert_eq!(page.index, 2);
    }
}
