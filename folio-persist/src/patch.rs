//! Partial-document payloads and the merge that coalesces them.

use folio_core::{ContentModel, PageSettings};
use serde::{Deserialize, Serialize};

/// A shallow partial update to one document.
///
/// Only the fields present travel on the wire (`None` fields are skipped),
/// so a title-only edit never re-uploads content. Within one debounce
/// window patches are folded left-to-right with [`DocumentPatch::merge_from`]:
/// the last write per field wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Canonical content: the full document's ordered node array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentModel>,
    #[serde(rename = "docSetting", skip_serializing_if = "Option::is_none")]
    pub settings: Option<PageSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_style: Option<String>,
}

impl DocumentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: ContentModel) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    pub fn settings(settings: PageSettings) -> Self {
        Self {
            settings: Some(settings),
            ..Self::default()
        }
    }

    pub fn bullet_style(style: impl Into<String>) -> Self {
        Self {
            bullet_style: Some(style.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.settings.is_none()
            && self.bullet_style.is_none()
    }

    /// Right-biased shallow merge: `later`'s present fields overwrite.
    pub fn merge_from(&mut self, later: DocumentPatch) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.content.is_some() {
            self.content = later.content;
        }
        if later.settings.is_some() {
            self.settings = later.settings;
        }
        if later.bullet_style.is_some() {
            self.bullet_style = later.bullet_style;
        }
    }

    /// Fold a payload list left-to-right into one patch.
    pub fn merge_all(patches: impl IntoIterator<Item = DocumentPatch>) -> DocumentPatch {
        let mut merged = DocumentPatch::default();
        for patch in patches {
            merged.merge_from(patch);
        }
        merged
    }
}
