use pdfnotes_core::{
    BackendError, ClientConfig, HttpBackend, IngestionController, IngestionError,
    IngestionOutcome, IngestionPhase, Note, NoteStore, PresentedFile,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(uri: &str) -> HttpBackend {
    let config = ClientConfig {
        api_base_url: uri.to_string(),
        ..ClientConfig::default()
    };
    HttpBackend::new(&config).unwrap()
}

fn pdf(name: &str) -> PresentedFile {
    PresentedFile::new(name, "application/pdf", b"%PDF-1.7 test".to_vec())
}

async fn mount_parse(server: &MockServer, template: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/parse"))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn successful_extraction_replaces_collection_in_response_order() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            {"page": 5, "original_text": "later", "note": ""},
            {"page": 1, "original_text": "Lorem", "note": "Important"},
            {"page": 3, "original_text": "", "note": "Follow up"}
        ])),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let reader = controller.notes();

    let outcome = controller.select_file(pdf("paper.pdf")).await;

    assert_eq!(outcome, IngestionOutcome::Accepted { notes: 3 });
    assert_eq!(controller.phase(), IngestionPhase::Succeeded);
    let pages: Vec<u32> = reader.snapshot().iter().map(|note| note.page).collect();
    assert_eq!(pages, vec![5, 1, 3]);
    assert_eq!(reader.snapshot()[2], Note::standalone(3, "Follow up"));

    let file = controller.accepted_file().unwrap();
    assert_eq!(file.name, "paper.pdf");
    assert_eq!(file.size_bytes, 13);
    assert!(controller.error().is_none());
    assert!(controller.can_clear());
}

#[tokio::test]
async fn invalid_file_type_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    mount_parse(&server, ResponseTemplate::new(200).set_body_json(json!([])), 0).await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let reader = controller.notes();

    for media_type in ["image/png", "text/plain", "", "application/x-pdf"] {
        let file = PresentedFile::new("notes", media_type, b"data".to_vec());
        let outcome = controller.drop_file(file).await;

        assert!(matches!(
            outcome,
            IngestionOutcome::Rejected(IngestionError::InvalidFileType { .. })
        ));
        assert_eq!(controller.phase(), IngestionPhase::Idle);
        assert_eq!(
            controller.error_message(),
            Some("Please upload a valid PDF file.")
        );
        assert!(reader.is_empty());
        assert!(controller.is_input_enabled());
    }
}

#[tokio::test]
async fn invalid_file_after_success_leaves_collection_untouched() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([{"page": 1, "original_text": "kept"}])),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let reader = controller.notes();
    controller.select_file(pdf("first.pdf")).await;
    let generation = reader.generation();

    let outcome = controller
        .select_file(PresentedFile::new("photo.jpg", "image/jpeg", vec![1, 2, 3]))
        .await;

    assert!(matches!(outcome, IngestionOutcome::Rejected(_)));
    assert_eq!(reader.len(), 1);
    assert_eq!(reader.generation(), generation);
    assert_eq!(controller.phase(), IngestionPhase::Succeeded);
}

#[tokio::test]
async fn server_error_fails_and_discards_file() {
    let server = MockServer::start().await;
    mount_parse(&server, ResponseTemplate::new(500), 1).await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let reader = controller.notes();

    let outcome = controller.select_file(pdf("paper.pdf")).await;

    match outcome {
        IngestionOutcome::Rejected(IngestionError::ExtractionFailed(BackendError::Status {
            status,
            ..
        })) => assert_eq!(status, 500),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(controller.phase(), IngestionPhase::Failed);
    assert!(controller.accepted_file().is_none());
    assert_eq!(
        controller.error_message(),
        Some("Failed to parse PDF. Please try again.")
    );
    assert!(reader.is_empty());
    assert!(controller.is_input_enabled());
}

#[tokio::test]
async fn malformed_payload_is_extraction_failure() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"notes": "not an array"})),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let outcome = controller.select_file(pdf("paper.pdf")).await;

    assert!(matches!(
        outcome,
        IngestionOutcome::Rejected(IngestionError::ExtractionFailed(BackendError::Malformed(_)))
    ));
    assert!(controller.notes().is_empty());
}

#[tokio::test]
async fn whitespace_only_note_keeps_every_annotation() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([
            {"page": 1, "original_text": "Lorem", "note": "Important"},
            {"page": 2, "original_text": "", "note": "\n"},
            {"page": 3, "original_text": "", "note": ""}
        ])),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let outcome = controller.select_file(pdf("paper.pdf")).await;

    assert_eq!(outcome, IngestionOutcome::Accepted { notes: 3 });
    let notes = controller.notes().snapshot();
    let pages: Vec<u32> = notes.iter().map(|note| note.page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(notes[1].note_text.as_deref(), Some("\n"));
    assert!(!notes[2].has_quote() && !notes[2].has_note());
}

#[tokio::test]
async fn unreachable_backend_is_extraction_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let controller = IngestionController::new(backend_for(&uri), NoteStore::new());

    let outcome = controller.select_file(pdf("paper.pdf")).await;

    assert!(matches!(
        outcome,
        IngestionOutcome::Rejected(IngestionError::ExtractionFailed(BackendError::Transport(_)))
    ));
    assert_eq!(controller.phase(), IngestionPhase::Failed);
}

#[tokio::test]
async fn second_file_during_submission_is_ignored() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!([{"page": 1, "original_text": "only once"}]))
            .set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());

    let late = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let input_enabled = controller.is_input_enabled();
        let phase = controller.phase();
        let cleared = controller.clear();
        controller.drag_over();
        let dragging = controller.is_dragging();
        let outcome = controller.drop_file(pdf("second.pdf")).await;
        (input_enabled, phase, cleared, dragging, outcome)
    };

    let (first, (input_enabled, phase, cleared, dragging, second)) =
        tokio::join!(controller.select_file(pdf("first.pdf")), late);

    assert_eq!(first, IngestionOutcome::Accepted { notes: 1 });
    assert_eq!(second, IngestionOutcome::Ignored);
    assert!(!input_enabled);
    assert_eq!(phase, IngestionPhase::Submitting);
    assert!(!cleared);
    assert!(!dragging);
    assert_eq!(controller.accepted_file().unwrap().name, "first.pdf");
}

#[tokio::test]
async fn clear_resets_every_reachable_state() {
    let server = MockServer::start().await;
    mount_parse(
        &server,
        ResponseTemplate::new(200).set_body_json(json!([{"page": 1, "note": "n"}])),
        1,
    )
    .await;

    let controller = IngestionController::new(backend_for(&server.uri()), NoteStore::new());
    let reader = controller.notes();

    assert!(controller.clear());
    assert_eq!(controller.phase(), IngestionPhase::Idle);

    controller.select_file(pdf("paper.pdf")).await;
    assert_eq!(reader.len(), 1);
    assert!(controller.clear());
    assert!(reader.is_empty());
    assert_eq!(controller.phase(), IngestionPhase::Idle);
    assert!(controller.accepted_file().is_none());
    assert!(!controller.can_clear());

    controller
        .select_file(PresentedFile::new("a.txt", "text/plain", vec![]))
        .await;
    assert!(controller.can_clear());
    assert!(controller.clear());
    assert!(controller.error().is_none());
    assert_eq!(controller.phase(), IngestionPhase::Idle);
}

#[tokio::test]
async fn drag_feedback_has_no_data_effect() {
    let controller = IngestionController::new(backend_for("http://127.0.0.1:1"), NoteStore::new());

    controller.drag_over();
    assert!(controller.is_dragging());
    controller.drag_leave();
    assert!(!controller.is_dragging());
    assert_eq!(controller.phase(), IngestionPhase::Idle);
    assert!(controller.notes().is_empty());
}
