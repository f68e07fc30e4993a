//! Canvas element engine
//!
//! Holds the elements of the active page in memory and applies every
//! mutation optimistically: position and size changes update local
//! state synchronously and persist in the background (fire-and-forget,
//! last write wins), while content edits persist first because they
//! arrive pre-debounced from the rich-text editor.

use crate::canvas::grid::{clamp_origin, snap_to_grid};
use crate::config;
use crate::database::{ElementContent, PageElement, Repository};
use crate::error::Result;
use tokio::task::JoinHandle;

/// Logical canvas extent; grows as elements approach its edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: config::CANVAS_DEFAULT_SIZE,
            height: config::CANVAS_DEFAULT_SIZE,
        }
    }
}

/// Position armed for text-element creation on the next keystroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCursor {
    pub x: f64,
    pub y: f64,
}

/// In-memory state of the active page's freeform canvas
pub struct CanvasEngine {
    repo: Repository,
    page_id: Option<String>,
    elements: Vec<PageElement>,
    selected: Option<String>,
    pending_cursor: Option<PendingCursor>,
    /// Just-created element awaiting editing focus in the shell
    new_element_id: Option<String>,
    canvas_size: CanvasSize,
}

impl CanvasEngine {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            page_id: None,
            elements: Vec::new(),
            selected: None,
            pending_cursor: None,
            new_element_id: None,
            canvas_size: CanvasSize::default(),
        }
    }

    // ===== Loading =====

    /// Load the elements of a page, replacing the in-memory set.
    ///
    /// A page with no elements (or an id that resolves to nothing)
    /// yields an empty canvas, not an error. `None` is a no-op.
    pub async fn load_elements(&mut self, page_id: Option<&str>) -> Result<()> {
        let Some(page_id) = page_id else {
            return Ok(());
        };

        let elements = self.repo.list_elements(page_id).await?;
        tracing::debug!("Loaded {} elements for page: {}", elements.len(), page_id);

        self.page_id = Some(page_id.to_string());
        self.elements = elements;
        self.selected = None;
        self.pending_cursor = None;
        self.new_element_id = None;
        self.canvas_size = CanvasSize::default();

        Ok(())
    }

    // ===== Click-to-create gesture =====

    /// Arm the creation cursor from a click at canvas-local coordinates.
    ///
    /// Only background clicks reach here; the shell filters clicks on
    /// existing elements. The anchor is offset so the default text box
    /// centers on the click point.
    pub fn arm_cursor(&mut self, x: f64, y: f64) {
        self.pending_cursor = Some(PendingCursor {
            x: clamp_origin(x - config::PENDING_CURSOR_OFFSET_X),
            y: clamp_origin(y - config::PENDING_CURSOR_OFFSET_Y),
        });
    }

    /// Dismiss the armed cursor (click outside the background, Escape)
    pub fn dismiss_cursor(&mut self) {
        self.pending_cursor = None;
    }

    /// Create a text element from the first keystroke after arming.
    ///
    /// `key` is the logical key value (`"a"`, `"Enter"`, `"Shift"`, …).
    /// Escape dismisses the cursor; other multi-character keys are
    /// ignored without consuming the armed state. Enter seeds an empty
    /// paragraph, any printable key seeds its character. The created
    /// element is selected and flagged for immediate editing focus.
    pub async fn commit_pending_as_text(&mut self, key: &str) -> Result<Option<PageElement>> {
        let Some(cursor) = self.pending_cursor else {
            return Ok(None);
        };
        let Some(page_id) = self.page_id.clone() else {
            return Ok(None);
        };

        if key == "Escape" {
            self.pending_cursor = None;
            return Ok(None);
        }

        if key.chars().count() > 1 && key != "Enter" {
            return Ok(None);
        }

        let html = if key == "Enter" {
            "<p></p>".to_string()
        } else {
            format!("<p>{}</p>", key)
        };

        // Floor at 0 so a canvas of negative z values still stacks new
        // elements on top
        let max_z = self
            .elements
            .iter()
            .map(|el| el.z_index)
            .max()
            .unwrap_or(0)
            .max(0);

        let element = self
            .repo
            .create_element(
                &page_id,
                &ElementContent::Text { html },
                cursor.x,
                cursor.y,
                config::TEXT_DEFAULT_WIDTH,
                config::TEXT_DEFAULT_HEIGHT,
                max_z + 1,
            )
            .await?;

        self.selected = Some(element.id.clone());
        self.new_element_id = Some(element.id.clone());
        self.pending_cursor = None;
        self.elements.push(element.clone());

        Ok(Some(element))
    }

    // ===== Element mutation =====

    /// Move an element, snapping to the grid unless `skip_snap`.
    ///
    /// The in-memory position updates synchronously; the store write
    /// runs in the background and is never rolled back. The returned
    /// handle lets callers await the write when they need to observe
    /// the persisted state; dropping it keeps fire-and-forget behavior.
    pub fn move_element(
        &mut self,
        id: &str,
        x: f64,
        y: f64,
        skip_snap: bool,
    ) -> Option<JoinHandle<()>> {
        let (final_x, final_y) = if skip_snap {
            (clamp_origin(x), clamp_origin(y))
        } else {
            (snap_to_grid(clamp_origin(x)), snap_to_grid(clamp_origin(y)))
        };

        let element = self.elements.iter_mut().find(|el| el.id == id)?;
        element.position_x = final_x;
        element.position_y = final_y;

        self.grow_canvas(final_x, final_y);

        let repo = self.repo.clone();
        let id = id.to_string();
        Some(tokio::spawn(async move {
            if let Err(e) = repo.update_element_position(&id, final_x, final_y).await {
                // A stale position write is less disruptive than a retry
                tracing::warn!("Dropped position write for element {}: {}", id, e);
            }
        }))
    }

    /// Resize an element with the same optimistic-then-persist pattern.
    ///
    /// Minimum sizes are enforced by the resize gesture per element
    /// type, not here.
    pub fn resize_element(&mut self, id: &str, width: f64, height: f64) -> Option<JoinHandle<()>> {
        let element = self.elements.iter_mut().find(|el| el.id == id)?;
        element.width = width;
        element.height = height;

        let repo = self.repo.clone();
        let id = id.to_string();
        Some(tokio::spawn(async move {
            if let Err(e) = repo.update_element_size(&id, width, height).await {
                tracing::warn!("Dropped size write for element {}: {}", id, e);
            }
        }))
    }

    /// Replace an element's content.
    ///
    /// Persists before updating local state: content edits arrive from
    /// a debounced editor callback, not a live interaction loop.
    pub async fn update_content(&mut self, id: &str, content: ElementContent) -> Result<()> {
        self.repo.update_element_content(id, &content).await?;

        if let Some(element) = self.elements.iter_mut().find(|el| el.id == id) {
            element.kind = content.kind().as_str().to_string();
            element.content_json = content.to_json()?;
        }

        Ok(())
    }

    /// Delete an element from the store and the in-memory set
    pub async fn delete_element(&mut self, id: &str) -> Result<()> {
        self.repo.delete_element(id).await?;

        self.elements.retain(|el| el.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.new_element_id.as_deref() == Some(id) {
            self.new_element_id = None;
        }

        Ok(())
    }

    /// Raise an element above everything else on the page.
    ///
    /// Each call assigns current max z-index + 1, so repeated calls are
    /// strictly monotonic.
    pub async fn bring_to_front(&mut self, id: &str) -> Result<i64> {
        let max_z = self.elements.iter().map(|el| el.z_index).max().unwrap_or(0);
        let z = max_z + 1;

        self.repo.update_element_z(id, z).await?;

        if let Some(element) = self.elements.iter_mut().find(|el| el.id == id) {
            element.z_index = z;
        }

        Ok(z)
    }

    // ===== Selection and render state =====

    pub fn select(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn elements(&self) -> &[PageElement] {
        &self.elements
    }

    pub fn element(&self, id: &str) -> Option<&PageElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn pending_cursor(&self) -> Option<PendingCursor> {
        self.pending_cursor
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    /// Take the id of the just-created element awaiting focus.
    /// The shell calls this once per creation to focus the editor.
    pub fn take_new_element_id(&mut self) -> Option<String> {
        self.new_element_id.take()
    }

    /// Elements in paint order: ascending z-index, ties keep insertion
    /// order (stable sort, no secondary key)
    pub fn render_order(&self) -> Vec<&PageElement> {
        let mut ordered: Vec<&PageElement> = self.elements.iter().collect();
        ordered.sort_by_key(|el| el.z_index);
        ordered
    }

    /// Grow the logical canvas so the position keeps a margin from the
    /// right/bottom edges
    fn grow_canvas(&mut self, x: f64, y: f64) {
        self.canvas_size.width = self.canvas_size.width.max(x + config::CANVAS_GROW_MARGIN);
        self.canvas_size.height = self.canvas_size.height.max(y + config::CANVAS_GROW_MARGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        initialize_database, CreateNotebookRequest, CreatePageRequest, CreateSectionRequest,
    };
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_engine() -> (CanvasEngine, Repository, String) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let repo = Repository::new(pool);

        let notebook = repo
            .create_notebook(CreateNotebookRequest::default())
            .await
            .unwrap();
        let section = repo
            .create_section(CreateSectionRequest {
                notebook_id: notebook.id,
                title: "Section".to_string(),
                order_index: 0,
                color: "#10b981".to_string(),
            })
            .await
            .unwrap();
        let page = repo
            .create_page(CreatePageRequest {
                section_id: section.id,
                parent_page_id: None,
                title: None,
                content: None,
                order_index: None,
            })
            .await
            .unwrap();

        let mut engine = CanvasEngine::new(repo.clone());
        engine.load_elements(Some(&page.id)).await.unwrap();

        (engine, repo, page.id)
    }

    #[tokio::test]
    async fn test_load_missing_page_yields_empty_canvas() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.load_elements(Some("no-such-page")).await.unwrap();
        assert!(engine.elements().is_empty());

        // None is a no-op
        engine.load_elements(None).await.unwrap();
    }

    #[tokio::test]
    async fn test_arm_cursor_offsets_and_clamps() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.arm_cursor(400.0, 300.0);
        assert_eq!(
            engine.pending_cursor(),
            Some(PendingCursor { x: 250.0, y: 250.0 })
        );

        engine.arm_cursor(100.0, 20.0);
        assert_eq!(
            engine.pending_cursor(),
            Some(PendingCursor { x: 0.0, y: 0.0 })
        );
    }

    #[tokio::test]
    async fn test_typing_creates_text_element_at_cursor() {
        let (mut engine, repo, page_id) = create_test_engine().await;

        engine.arm_cursor(400.0, 300.0);
        let element = engine
            .commit_pending_as_text("A")
            .await
            .unwrap()
            .expect("element should be created");

        assert_eq!(element.position_x, 250.0);
        assert_eq!(element.position_y, 250.0);
        assert_eq!(element.width, 300.0);
        assert_eq!(element.height, 100.0);
        assert_eq!(element.z_index, 1);
        assert!(element.content_json.contains("A"));

        assert_eq!(engine.selected_id(), Some(element.id.as_str()));
        assert_eq!(engine.take_new_element_id(), Some(element.id.clone()));
        assert!(engine.pending_cursor().is_none());

        // Persisted too
        let stored = repo.list_elements(&page_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, "text");
    }

    #[tokio::test]
    async fn test_enter_seeds_empty_paragraph() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.arm_cursor(100.0, 100.0);
        let element = engine
            .commit_pending_as_text("Enter")
            .await
            .unwrap()
            .unwrap();

        let content = element.content().unwrap();
        assert_eq!(
            content,
            ElementContent::Text {
                html: "<p></p>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_modifier_keys_do_not_consume_armed_state() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.arm_cursor(100.0, 100.0);

        for key in ["Shift", "ArrowLeft", "Control", "Tab"] {
            assert!(engine.commit_pending_as_text(key).await.unwrap().is_none());
            assert!(engine.pending_cursor().is_some());
        }

        // Escape dismisses instead
        assert!(engine
            .commit_pending_as_text("Escape")
            .await
            .unwrap()
            .is_none());
        assert!(engine.pending_cursor().is_none());
    }

    #[tokio::test]
    async fn test_move_snaps_to_grid_and_persists() {
        let (mut engine, repo, _page) = create_test_engine().await;

        engine.arm_cursor(200.0, 100.0);
        let element = engine.commit_pending_as_text("x").await.unwrap().unwrap();

        let handle = engine.move_element(&element.id, 97.0, 103.0, false).unwrap();

        // Optimistic update is visible immediately
        let in_memory = engine.element(&element.id).unwrap();
        assert_eq!(in_memory.position_x, 100.0);
        assert_eq!(in_memory.position_y, 100.0);

        handle.await.unwrap();
        let stored = repo.get_element(&element.id).await.unwrap();
        assert_eq!(stored.position_x, 100.0);
        assert_eq!(stored.position_y, 100.0);
    }

    #[tokio::test]
    async fn test_move_with_skip_snap_clamps_only() {
        let (mut engine, repo, _page) = create_test_engine().await;

        engine.arm_cursor(200.0, 100.0);
        let element = engine.commit_pending_as_text("x").await.unwrap().unwrap();

        let handle = engine.move_element(&element.id, -8.0, 33.0, true).unwrap();
        handle.await.unwrap();

        let stored = repo.get_element(&element.id).await.unwrap();
        assert_eq!(stored.position_x, 0.0);
        assert_eq!(stored.position_y, 33.0);
    }

    #[tokio::test]
    async fn test_move_unknown_element_is_noop() {
        let (mut engine, _repo, _page) = create_test_engine().await;
        assert!(engine.move_element("ghost", 10.0, 10.0, false).is_none());
    }

    #[tokio::test]
    async fn test_canvas_grows_near_edge() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.arm_cursor(200.0, 100.0);
        let element = engine.commit_pending_as_text("x").await.unwrap().unwrap();

        assert_eq!(engine.canvas_size(), CanvasSize::default());

        let handle = engine.move_element(&element.id, 2800.0, 100.0, false).unwrap();
        handle.await.unwrap();

        assert_eq!(engine.canvas_size().width, 3300.0);
        assert_eq!(engine.canvas_size().height, 3000.0);
    }

    #[tokio::test]
    async fn test_bring_to_front_is_strictly_monotonic() {
        let (mut engine, _repo, _page) = create_test_engine().await;

        engine.arm_cursor(100.0, 100.0);
        let a = engine.commit_pending_as_text("a").await.unwrap().unwrap();
        engine.arm_cursor(300.0, 300.0);
        let b = engine.commit_pending_as_text("b").await.unwrap().unwrap();

        assert_eq!(a.z_index, 1);
        assert_eq!(b.z_index, 2);

        let z1 = engine.bring_to_front(&a.id).await.unwrap();
        assert_eq!(z1, 3);

        // Second call still increments relative to the new max
        let z2 = engine.bring_to_front(&a.id).await.unwrap();
        assert_eq!(z2, 4);
    }

    #[tokio::test]
    async fn test_render_order_ascending_z_with_stable_ties() {
        let (mut engine, repo, page_id) = create_test_engine().await;

        for z in [3, 1, 2] {
            repo.create_element(
                &page_id,
                &ElementContent::Text {
                    html: format!("<p>{}</p>", z),
                },
                0.0,
                0.0,
                300.0,
                100.0,
                z,
            )
            .await
            .unwrap();
        }
        engine.load_elements(Some(&page_id)).await.unwrap();

        let order: Vec<i64> = engine.render_order().iter().map(|el| el.z_index).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_clears_selection() {
        let (mut engine, repo, page_id) = create_test_engine().await;

        engine.arm_cursor(100.0, 100.0);
        let element = engine.commit_pending_as_text("x").await.unwrap().unwrap();
        assert_eq!(engine.selected_id(), Some(element.id.as_str()));

        engine.delete_element(&element.id).await.unwrap();

        assert!(engine.selected_id().is_none());
        assert!(engine.elements().is_empty());
        assert!(repo.list_elements(&page_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_content_persists_then_updates_memory() {
        let (mut engine, repo, _page) = create_test_engine().await;

        engine.arm_cursor(100.0, 100.0);
        let element = engine.commit_pending_as_text("x").await.unwrap().unwrap();

        let new_content = ElementContent::Text {
            html: "<p>edited</p>".to_string(),
        };
        engine
            .update_content(&element.id, new_content.clone())
            .await
            .unwrap();

        assert_eq!(
            engine.element(&element.id).unwrap().content().unwrap(),
            new_content
        );
        assert_eq!(
            repo.get_element(&element.id).await.unwrap().content().unwrap(),
            new_content
        );
    }
}
