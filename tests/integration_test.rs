//! End-to-end tests driving the engine the way the UI shell does:
//! real pool against a file-backed database, blob store on disk, and
//! the full create/edit/export/import lifecycle.

use mrnotes_core::canvas::{CanvasEngine, DragGesture, DragMode, ResizeGesture};
use mrnotes_core::database::{
    create_pool, CreateNotebookRequest, CreatePageRequest, CreateSectionRequest, ElementContent,
    Page, RecordKind, Repository,
};
use mrnotes_core::services::{
    ArchiveService, AttachmentService, ImportOutcome, NotebookService, PageService,
};
use mrnotes_core::storage::BlobStore;
use tempfile::TempDir;

struct App {
    repo: Repository,
    blob_store: BlobStore,
    notebooks: NotebookService,
    pages: PageService,
    attachments: AttachmentService,
    archives: ArchiveService,
    _temp: TempDir,
}

async fn start_app() -> App {
    let temp = TempDir::new().unwrap();

    let pool = create_pool(&temp.path().join("data").join("notes.db"))
        .await
        .unwrap();
    let repo = Repository::new(pool);

    let blob_store = BlobStore::new(temp.path().join("blobs"));
    blob_store.initialize().await.unwrap();

    App {
        notebooks: NotebookService::new(repo.clone(), blob_store.clone()),
        pages: PageService::new(repo.clone(), blob_store.clone()),
        attachments: AttachmentService::new(repo.clone(), blob_store.clone()),
        archives: ArchiveService::new(repo.clone(), blob_store.clone()),
        repo,
        blob_store,
        _temp: temp,
    }
}

async fn seed_page(app: &App) -> Page {
    let notebook = app
        .notebooks
        .create_notebook(CreateNotebookRequest {
            title: Some("Work".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let section = app
        .notebooks
        .create_section(CreateSectionRequest {
            notebook_id: notebook.id,
            title: "Inbox".to_string(),
            order_index: 0,
            color: "#10b981".to_string(),
        })
        .await
        .unwrap();

    app.repo
        .create_page(CreatePageRequest {
            section_id: section.id,
            parent_page_id: None,
            title: Some("Scratch".to_string()),
            content: None,
            order_index: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn canvas_lifecycle_from_click_to_restore() {
    let app = start_app().await;
    let page = seed_page(&app).await;

    let mut engine = CanvasEngine::new(app.repo.clone());
    engine.load_elements(Some(&page.id)).await.unwrap();

    // Click the canvas background, then type: a text box appears
    // centered on the click, snapped defaults applied
    engine.arm_cursor(400.0, 300.0);
    let element = engine
        .commit_pending_as_text("A")
        .await
        .unwrap()
        .expect("first keystroke creates the element");
    assert_eq!((element.position_x, element.position_y), (250.0, 250.0));
    assert_eq!((element.width, element.height), (300.0, 100.0));

    // Drag it; live mode snaps every move
    let mut drag = DragGesture::begin(&engine, &element.id, (260.0, 260.0)).unwrap();
    assert_eq!(drag.mode(), DragMode::Live);
    if let Some(handle) = drag.pointer_move(&mut engine, (107.0, 113.0)) {
        handle.await.unwrap();
    }
    if let Some(handle) = drag.pointer_up(&mut engine, (107.0, 113.0), false) {
        handle.await.unwrap();
    }

    let stored = app.repo.get_element(&element.id).await.unwrap();
    assert_eq!((stored.position_x, stored.position_y), (100.0, 100.0));

    // Resize respects the text minimum
    let mut resize = ResizeGesture::begin(&engine, &element.id, (400.0, 200.0)).unwrap();
    if let Some(handle) = resize.pointer_move(&mut engine, (0.0, 0.0)) {
        handle.await.unwrap();
    }
    let stored = app.repo.get_element(&element.id).await.unwrap();
    assert_eq!((stored.width, stored.height), (150.0, 50.0));

    // A fresh engine sees the persisted state
    let mut reloaded = CanvasEngine::new(app.repo.clone());
    reloaded.load_elements(Some(&page.id)).await.unwrap();
    let element = &reloaded.elements()[0];
    assert_eq!((element.position_x, element.position_y), (100.0, 100.0));
    assert_eq!((element.width, element.height), (150.0, 50.0));
}

#[tokio::test]
async fn render_order_follows_z_not_creation() {
    let app = start_app().await;
    let page = seed_page(&app).await;

    let mut ids = Vec::new();
    for z in [3, 1, 2] {
        let element = app
            .repo
            .create_element(
                &page.id,
                &ElementContent::Text {
                    html: format!("<p>z{}</p>", z),
                },
                0.0,
                0.0,
                300.0,
                100.0,
                z,
            )
            .await
            .unwrap();
        ids.push((z, element.id));
    }

    let mut engine = CanvasEngine::new(app.repo.clone());
    engine.load_elements(Some(&page.id)).await.unwrap();

    let order: Vec<&str> = engine
        .render_order()
        .iter()
        .map(|el| el.id.as_str())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_by_key(|(z, _)| *z);
    let expect: Vec<&str> = sorted.iter().map(|(_, id)| id.as_str()).collect();
    assert_eq!(order, expect);

    // Clicking the bottom element raises it above all others
    let bottom = &ids.iter().find(|(z, _)| *z == 1).unwrap().1;
    let z = engine.bring_to_front(bottom).await.unwrap();
    assert_eq!(z, 4);
    assert_eq!(engine.render_order().last().unwrap().id, *bottom);
}

#[tokio::test]
async fn full_backup_roundtrip_restores_bytes_exactly() {
    let app = start_app().await;
    let page = seed_page(&app).await;

    app.pages.add_tag(&page.id, "inbox", "#f59e0b").await.unwrap();
    let payload: Vec<u8> = (0u8..=255).collect();
    app.attachments
        .attach(&page.id, "bytes.bin", "application/octet-stream", &payload)
        .await
        .unwrap();
    app.repo.set_setting("sidebar", "collapsed").await.unwrap();

    let archive = app.archives.export_all().await.unwrap();
    let json = serde_json::to_string_pretty(&archive).unwrap();

    let restored = start_app().await;
    let outcome = restored.archives.import_archive(&json).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::FullRestore { notebooks: 1 }));

    let notebooks = restored.repo.list_notebooks().await.unwrap();
    let sections = restored.repo.list_sections(&notebooks[0].id).await.unwrap();
    let pages = restored.repo.list_pages(&sections[0].id).await.unwrap();
    assert_eq!(pages[0].title, "Scratch");

    let attachments = restored.attachments.list(&pages[0].id).await.unwrap();
    assert_eq!(attachments[0].filename, "bytes.bin");
    assert_eq!(
        restored.attachments.read(&attachments[0]).await.unwrap(),
        payload
    );

    let tags = restored.repo.list_tags_for_page(&pages[0].id).await.unwrap();
    assert_eq!(tags[0].name, "inbox");
    assert_eq!(
        restored.repo.get_setting("sidebar").await.unwrap().as_deref(),
        Some("collapsed")
    );
}

#[tokio::test]
async fn malformed_backup_leaves_store_untouched() {
    let app = start_app().await;

    let err = app
        .archives
        .import_archive(r#"{"fileFormat":"MRNotes","version":"1.0.0","notebooks":[{"title":3}]}"#)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("malformed"));

    assert!(app.repo.list_notebooks().await.unwrap().is_empty());
    assert!(app.repo.list_settings().await.unwrap().is_empty());
}

#[tokio::test]
async fn notebook_delete_cascades_and_reclaims_blobs() {
    let app = start_app().await;
    let page = seed_page(&app).await;

    let attachment = app
        .attachments
        .attach(&page.id, "doc.txt", "text/plain", b"contents")
        .await
        .unwrap();
    let hash = attachment.blob_hash.clone();

    let notebook_id = {
        let section = app.repo.get_section(&page.section_id).await.unwrap();
        section.notebook_id
    };

    app.notebooks.delete_notebook(&notebook_id).await.unwrap();

    // The notebook row is soft-deleted, everything beneath it is gone
    assert!(app.notebooks.list_notebooks().await.unwrap().is_empty());
    let hidden = app.notebooks.get_notebook(&notebook_id).await.unwrap();
    assert!(hidden.deleted_at.is_some());
    assert!(app.repo.get_page(&page.id).await.is_err());
    assert!(!app.blob_store.exists(&hash).await.unwrap());

    app.notebooks.purge_notebook(&notebook_id).await.unwrap();
    assert!(app.repo.get_notebook(&notebook_id).await.is_err());
}

#[tokio::test]
async fn change_events_fire_for_writes() {
    let app = start_app().await;
    let mut events = app.repo.subscribe();

    seed_page(&app).await;

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    assert!(kinds.contains(&RecordKind::Notebook));
    assert!(kinds.contains(&RecordKind::Section));
    assert!(kinds.contains(&RecordKind::Page));
}

#[tokio::test]
async fn markdown_export_and_reimport() {
    let app = start_app().await;
    let page = seed_page(&app).await;

    let md = app
        .archives
        .export_page_markdown(&page.id)
        .await
        .unwrap()
        .unwrap();
    assert!(md.starts_with("# Scratch\n"));

    let imported = app
        .archives
        .import_markdown(&page.section_id, "scratch-copy", &md)
        .await
        .unwrap();
    assert_eq!(imported.title, "Scratch");
    assert_eq!(imported.order_index, 1);
}
