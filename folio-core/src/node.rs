//! Block nodes — the opaque units of document content.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag for a block node.
///
/// Tags are serialized camelCase to match the rich-text editor's canonical
/// node names (`"bulletList"`, `"codeBlock"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    Blockquote,
    CodeBlock,
    Table,
    Image,
    HorizontalRule,
}

/// One block of document content.
///
/// The `content` field is the node's serialized markup and is opaque to
/// this crate — pagination and persistence never look inside it. The `id`
/// is stable across measurement and reflow passes; only rewriting the
/// node's markup goes through [`BlockNode::set_content`], which keeps the
/// identity so hosts can diff revisions of the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockNode {
    pub id: Uuid,
    pub kind: BlockKind,
    pub content: String,
}

impl BlockNode {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
        }
    }

    /// Shorthand for the most common block kind.
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, content)
    }

    /// Rewrite the node's markup in place, keeping its identity.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}
