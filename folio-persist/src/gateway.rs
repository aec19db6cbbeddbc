//! The storage capability — everything durable goes through this trait.

use crate::patch::DocumentPatch;
use folio_core::{ContentModel, PageSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage namespace a record lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Document,
    Memo,
    Setting,
}

impl DocumentKind {
    /// Endpoint name on the backing API.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Document => "documents",
            DocumentKind::Memo => "memo",
            DocumentKind::Setting => "setting",
        }
    }
}

/// Gateway errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No record under the given id
    NotFound(Uuid),
    /// Network or storage transport failed
    Transport(String),
    /// Payload could not be (de)serialized
    Serialization(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::NotFound(id) => write!(f, "document {id} not found"),
            GatewayError::Transport(e) => write!(f, "transport error: {e}"),
            GatewayError::Serialization(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// One fully persisted document.
///
/// The settings block travels with the content because the per-page
/// content budget must be recomputable on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: Uuid,
    pub title: String,
    pub content: ContentModel,
    #[serde(rename = "docSetting")]
    pub settings: PageSettings,
    pub bullet_style: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl DocumentRecord {
    pub fn empty(id: Uuid, now_millis: u64) -> Self {
        Self {
            id,
            title: String::new(),
            content: ContentModel::new(),
            settings: PageSettings::default(),
            bullet_style: None,
            created_at: now_millis,
            updated_at: now_millis,
        }
    }

    /// Apply a partial update field-by-field.
    pub fn apply(&mut self, patch: &DocumentPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(settings) = &patch.settings {
            self.settings = *settings;
        }
        if let Some(style) = &patch.bullet_style {
            self.bullet_style = Some(style.clone());
        }
    }
}

/// Durable storage of document metadata and content, plus derived
/// thumbnail generation.
///
/// Futures are `Send` so the save queue can drive them from spawned
/// tasks; implementations write plain `async fn`s.
pub trait PersistenceGateway: Send + Sync + 'static {
    /// Allocate a new empty record, returning its id.
    fn create(
        &self,
        kind: DocumentKind,
    ) -> impl Future<Output = Result<Uuid, GatewayError>> + Send;

    /// Apply a partial update; returns the payload as applied.
    fn update(
        &self,
        kind: DocumentKind,
        id: Uuid,
        patch: DocumentPatch,
    ) -> impl Future<Output = Result<DocumentPatch, GatewayError>> + Send;

    /// Load the full record.
    fn fetch(
        &self,
        kind: DocumentKind,
        id: Uuid,
    ) -> impl Future<Output = Result<DocumentRecord, GatewayError>> + Send;

    /// Render a preview image for the given content. Best effort: `None`
    /// means the backend opted out; errors never fail a save.
    fn generate_thumbnail(
        &self,
        content: &ContentModel,
        settings: &PageSettings,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, GatewayError>> + Send;
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// In-memory gateway for tests and headless hosts.
///
/// Stores records in a map and supports injecting transport failures to
/// exercise the save queue's retry path.
#[derive(Default)]
pub struct MemoryGateway {
    records: RwLock<HashMap<(DocumentKind, Uuid), DocumentRecord>>,
    fail_remaining: AtomicU32,
    update_calls: AtomicU32,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` `update` calls fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total `update` calls seen, including injected failures.
    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn create(&self, kind: DocumentKind) -> Result<Uuid, GatewayError> {
        let id = Uuid::new_v4();
        let record = DocumentRecord::empty(id, now_millis());
        self.records.write().await.insert((kind, id), record);
        Ok(id)
    }

    async fn update(
        &self,
        kind: DocumentKind,
        id: Uuid,
        patch: DocumentPatch,
    ) -> Result<DocumentPatch, GatewayError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GatewayError::Transport("injected failure".into()));
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(&(kind, id))
            .ok_or(GatewayError::NotFound(id))?;
        record.apply(&patch);
        record.updated_at = now_millis();
        Ok(patch)
    }

    async fn fetch(&self, kind: DocumentKind, id: Uuid) -> Result<DocumentRecord, GatewayError> {
        self.records
            .read()
            .await
            .get(&(kind, id))
            .cloned()
            .ok_or(GatewayError::NotFound(id))
    }

    async fn generate_thumbnail(
        &self,
        content: &ContentModel,
        settings: &PageSettings,
    ) -> Result<Option<Vec<u8>>, GatewayError> {
        // A placeholder blob; a real backend rasterizes the first page.
        let preview = format!(
            "thumb:{}x{}:{} nodes",
            settings.page_width,
            settings.page_height,
            content.len()
        );
        Ok(Some(preview.into_bytes()))
    }
}
