//! End-to-end session tests: edit → reflow → save → reopen.
//!
//! Verifies the subsystem's core promise across a whole session: however
//! many reflow cascades a burst of edits triggers, the canonical document
//! that reaches storage — and comes back on the next open — is
//! node-for-node identical to what was written.

use folio_core::{BlockKind, BlockNode, PageSettings};
use folio_editor::EditorSession;
use folio_layout::{FixedMeasure, MeasurementOracle};
use folio_persist::{DocumentKind, MemoryGateway, PersistenceGateway, SaveQueue};

use std::sync::Arc;
use std::time::Duration;

fn harness() -> (Arc<MemoryGateway>, Arc<SaveQueue<MemoryGateway>>) {
    let gateway = Arc::new(MemoryGateway::new());
    let queue = Arc::new(SaveQueue::with_defaults(gateway.clone()));
    (gateway, queue)
}

#[tokio::test(start_paused = true)]
async fn test_full_writing_session_roundtrips() {
    let (gateway, queue) = harness();
    let mut oracle = FixedMeasure::new();

    let mut session = EditorSession::create(gateway.as_ref(), queue.clone())
        .await
        .unwrap();
    let doc_id = session.doc_id();

    session.set_title("Field notes").await;

    // A realistic writing session: headings, paragraphs, one tall image,
    // settling layout after every burst.
    let heights = [
        (BlockKind::Heading, 64.0),
        (BlockKind::Paragraph, 120.0),
        (BlockKind::Paragraph, 250.0),
        (BlockKind::Image, 1400.0), // taller than the whole page budget
        (BlockKind::Paragraph, 90.0),
        (BlockKind::Table, 480.0),
        (BlockKind::Paragraph, 330.0),
        (BlockKind::Paragraph, 330.0),
        (BlockKind::Paragraph, 330.0),
    ];
    for (i, (kind, height)) in heights.iter().enumerate() {
        let node = BlockNode::new(*kind, format!("block {i}"));
        oracle.set(node.id, *height);
        session
            .edit_last_page(|content| content.push(node))
            .await
            .unwrap();
        session.layout_settled(&oracle).await.unwrap();
    }

    let written = session.document();
    assert_eq!(written.len(), heights.len());
    assert!(session.page_count() > 1, "content must have overflowed");

    // The oversized image sits alone on its page.
    let image_page = session
        .pages()
        .iter()
        .find(|p| p.content.iter().any(|n| n.kind == BlockKind::Image))
        .unwrap();
    assert_eq!(image_page.node_count(), 1);

    // Let the debounce drain, then close (final flush).
    tokio::time::sleep(Duration::from_secs(3)).await;
    session.close().await.unwrap();

    // Reopen: same title, same nodes, same order.
    let reopened = EditorSession::open(gateway.as_ref(), queue, doc_id, &oracle)
        .await
        .unwrap();
    assert_eq!(reopened.title(), "Field notes");
    assert_eq!(reopened.document(), written);
    assert!(!reopened.is_layout_dirty());

    // Every multi-node page respects the budget.
    for page in reopened.pages() {
        if page.node_count() > 1 {
            let extent: f64 = page
                .content
                .iter()
                .map(|n| oracle.node_height(n).unwrap())
                .sum();
            assert!(extent <= reopened.budget());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_settings_change_survives_reopen() {
    let (gateway, queue) = harness();
    let mut oracle = FixedMeasure::new();

    let mut session = EditorSession::create(gateway.as_ref(), queue.clone())
        .await
        .unwrap();
    let doc_id = session.doc_id();

    let node = BlockNode::paragraph("content");
    oracle.set(node.id, 100.0);
    session
        .edit_last_page(|content| content.push(node))
        .await
        .unwrap();
    session.layout_settled(&oracle).await.unwrap();

    let letter = PageSettings {
        page_width: 216.0,
        page_height: 279.0,
        ..PageSettings::default()
    };
    session.update_settings(letter, &oracle).await.unwrap();
    session.close().await.unwrap();

    let reopened = EditorSession::open(gateway.as_ref(), queue, doc_id, &oracle)
        .await
        .unwrap();
    assert_eq!(*reopened.settings(), letter);
    assert_eq!(reopened.document().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_is_one_durable_write() {
    let (gateway, queue) = harness();
    let mut oracle = FixedMeasure::new();

    let mut session = EditorSession::create(gateway.as_ref(), queue)
        .await
        .unwrap();
    let doc_id = session.doc_id();
    let calls_after_create = gateway.update_calls();

    // Ten edits in one debounce window.
    for i in 0..10 {
        let node = BlockNode::paragraph(format!("burst {i}"));
        oracle.set(node.id, 40.0);
        session
            .edit_last_page(|content| content.push(node))
            .await
            .unwrap();
    }
    session.layout_settled(&oracle).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(
        gateway.update_calls() - calls_after_create,
        1,
        "a burst coalesces into exactly one durable write"
    );

    let record = gateway.fetch(DocumentKind::Document, doc_id).await.unwrap();
    assert_eq!(record.content.len(), 10);
}
