//! One open document: pages, budget, and the edit→reflow→save wiring.

use folio_core::{ContentModel, Page, PageSettings, SettingsError, DEFAULT_RENDER_WIDTH};
use folio_layout::{assemble, paginate, reflow_from, renumber, LayoutError, MeasurementOracle};
use folio_persist::{
    DocumentKind, DocumentPatch, GatewayError, PersistenceGateway, SaveError, SaveQueue,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("page index {0} out of range")]
    PageOutOfRange(usize),
}

/// The single source of truth for one open document.
///
/// Owns the page list and the computed content budget, and routes every
/// fragment mutation into the shared [`SaveQueue`]. All state is explicit
/// — the host passes the session by reference into whatever state
/// propagation it prefers; nothing here is ambient or global.
///
/// Pagination never runs against missing measurements: when the host's
/// layout has not settled, the session opens provisionally (everything on
/// one page) and finishes the split on the first [`EditorSession::layout_settled`]
/// tick that can measure.
pub struct EditorSession<G: PersistenceGateway> {
    doc_id: Uuid,
    title: String,
    settings: PageSettings,
    bullet_style: Option<String>,
    budget: f64,
    pages: Vec<Page>,
    queue: Arc<SaveQueue<G>>,
    /// Lowest page index edited since the last settled layout pass.
    dirty_from: Option<usize>,
}

impl<G: PersistenceGateway> EditorSession<G> {
    /// Create a fresh empty document and open a session on it.
    pub async fn create(
        gateway: &G,
        queue: Arc<SaveQueue<G>>,
    ) -> Result<Self, SessionError> {
        let doc_id = gateway.create(DocumentKind::Document).await?;
        let settings = PageSettings::default();
        let budget = settings.content_budget(DEFAULT_RENDER_WIDTH)?;

        log::debug!("created document {doc_id}");
        Ok(Self {
            doc_id,
            title: String::new(),
            settings,
            bullet_style: None,
            budget,
            pages: vec![Page::new(0, budget)],
            queue,
            dirty_from: None,
        })
    }

    /// Load an existing document and paginate it.
    ///
    /// Degenerate page settings are rejected here — a stored document
    /// whose margins consume the page never reaches the paginator.
    pub async fn open(
        gateway: &G,
        queue: Arc<SaveQueue<G>>,
        doc_id: Uuid,
        oracle: &dyn MeasurementOracle,
    ) -> Result<Self, SessionError> {
        let record = gateway.fetch(DocumentKind::Document, doc_id).await?;
        let budget = record.settings.content_budget(DEFAULT_RENDER_WIDTH)?;

        let (pages, dirty_from) = match paginate(&record.content, budget, oracle) {
            Ok(pages) => (pages, None),
            Err(
                LayoutError::MeasurementUnavailable(_)
                | LayoutError::PageMeasurementUnavailable(_),
            ) => {
                // Layout has not settled; open provisionally and split on
                // the first tick that can measure.
                log::debug!("opening {doc_id} provisionally (layout not settled)");
                (
                    vec![Page::with_content(0, record.content.clone(), budget)],
                    Some(0),
                )
            }
            Err(e) => return Err(e.into()),
        };

        log::debug!("opened {doc_id}: {} pages", pages.len());
        Ok(Self {
            doc_id,
            title: record.title,
            settings: record.settings,
            bullet_style: record.bullet_style,
            budget,
            pages,
            queue,
            dirty_from,
        })
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn doc_id(&self) -> Uuid {
        self.doc_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether a reflow pass is owed on the next settle tick.
    pub fn is_layout_dirty(&self) -> bool {
        self.dirty_from.is_some()
    }

    /// The canonical document: all pages' nodes in reading order.
    pub fn document(&self) -> ContentModel {
        assemble(&self.pages)
    }

    // ── Edits ──────────────────────────────────────────────────────

    /// Mutate one page's fragment and queue a save.
    ///
    /// The page is remembered as the reflow starting point; the split
    /// itself waits for the next settle tick, when the host can measure
    /// the changed content.
    pub async fn edit_page(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut ContentModel),
    ) -> Result<(), SessionError> {
        let page = self
            .pages
            .get_mut(index)
            .ok_or(SessionError::PageOutOfRange(index))?;
        f(&mut page.content);

        self.dirty_from = Some(self.dirty_from.map_or(index, |d| d.min(index)));
        self.enqueue_content().await;
        Ok(())
    }

    /// Mutate the last page — the append-biased common case.
    pub async fn edit_last_page(
        &mut self,
        f: impl FnOnce(&mut ContentModel),
    ) -> Result<(), SessionError> {
        self.edit_page(self.pages.len() - 1, f).await
    }

    pub async fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.queue
            .enqueue(
                DocumentKind::Document,
                self.doc_id,
                DocumentPatch::title(self.title.clone()),
            )
            .await;
    }

    pub async fn set_bullet_style(&mut self, style: impl Into<String>) {
        let style = style.into();
        self.bullet_style = Some(style.clone());
        self.queue
            .enqueue(
                DocumentKind::Document,
                self.doc_id,
                DocumentPatch::bullet_style(style),
            )
            .await;
    }

    /// Change the physical page geometry and repaginate everything.
    pub async fn update_settings(
        &mut self,
        settings: PageSettings,
        oracle: &dyn MeasurementOracle,
    ) -> Result<(), SessionError> {
        let budget = settings.content_budget(DEFAULT_RENDER_WIDTH)?;
        let doc = self.document();

        match paginate(&doc, budget, oracle) {
            Ok(pages) => {
                self.pages = pages;
                self.dirty_from = None;
            }
            Err(
                LayoutError::MeasurementUnavailable(_)
                | LayoutError::PageMeasurementUnavailable(_),
            ) => {
                self.pages = vec![Page::with_content(0, doc, budget)];
                self.dirty_from = Some(0);
            }
            Err(e) => return Err(e.into()),
        }

        self.settings = settings;
        self.budget = budget;
        self.queue
            .enqueue(
                DocumentKind::Document,
                self.doc_id,
                DocumentPatch::settings(settings),
            )
            .await;
        Ok(())
    }

    // ── Layout ─────────────────────────────────────────────────────

    /// Run the owed reflow pass, if any. Called once layout settles.
    ///
    /// Cascades from the lowest edited page; pages past the first one
    /// that fits are untouched. If the host still cannot measure, the
    /// pass stays owed and is retried on the next tick — never run
    /// against a missing measurement. Returns whether any node moved.
    pub async fn layout_settled(
        &mut self,
        oracle: &dyn MeasurementOracle,
    ) -> Result<bool, SessionError> {
        let Some(start) = self.dirty_from else {
            return Ok(false);
        };

        match reflow_from(&mut self.pages, start, self.budget, oracle) {
            Ok(moved) => {
                renumber(&mut self.pages, self.budget);
                self.dirty_from = None;
                if moved {
                    // Page fragments changed; the canonical document did
                    // not, but the fragment mutation still rides the
                    // debounce like any other.
                    self.enqueue_content().await;
                }
                Ok(moved)
            }
            Err(
                LayoutError::MeasurementUnavailable(_)
                | LayoutError::PageMeasurementUnavailable(_),
            ) => {
                log::trace!("layout still unsettled for {}; pass deferred", self.doc_id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Persistence ────────────────────────────────────────────────

    /// Write everything pending now and await durability (Ctrl-S).
    pub async fn save_now(&self) -> Result<(), SaveError> {
        self.queue.flush_now(self.doc_id).await
    }

    /// Close the session: final flush, awaiting any in-flight write.
    pub async fn close(self) -> Result<(), SaveError> {
        log::debug!("closing document {}", self.doc_id);
        self.queue.close(self.doc_id).await
    }

    async fn enqueue_content(&self) {
        self.queue
            .enqueue(
                DocumentKind::Document,
                self.doc_id,
                DocumentPatch::content(self.document()),
            )
            .await;
    }
}
