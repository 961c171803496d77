//! End-to-end tests of the print run against mocked Gmail and printer

mod common;

use common::*;
use eprinter::attachment::AttachmentHandler;
use eprinter::error::PrinterError;
use eprinter::models::{Message, PartBody};
use eprinter::pipeline::PrintPipeline;
use mockall::predicate::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

const EXPECTED_QUERY: &str =
    "has:attachment -label:Printed from:(a@x.com OR b@x.com) subject:(Invoice)";

fn pipeline(client: MockMailClient, printer: MockPrinter, spool: &TempDir) -> PrintPipeline {
    let handler = AttachmentHandler::new(spool.path(), Box::new(printer));
    PrintPipeline::new(Arc::new(client), handler, create_test_config(spool.path()))
}

/// Client that knows the printed label and returns `messages` for the query
fn client_with_messages(messages: Vec<Message>) -> MockMailClient {
    let mut client = MockMailClient::new();
    client
        .expect_list_labels()
        .returning(|| Ok(vec![create_test_label_info("INBOX", "INBOX"), printed_label()]));
    client.expect_create_label().times(0);

    let summaries = messages.iter().map(|m| summary(&m.id)).collect::<Vec<_>>();
    client
        .expect_find_messages()
        .with(eq(EXPECTED_QUERY))
        .times(1)
        .returning(move |_| Ok(summaries.clone()));

    for message in messages {
        let id = message.id.clone();
        client
            .expect_get_message()
            .withf(move |message_id| message_id == id)
            .times(1)
            .returning(move |_| Ok(message.clone()));
    }

    client
}

#[tokio::test]
async fn test_prints_attachments_then_labels_once() {
    let spool = tempdir().unwrap();
    let mut client = client_with_messages(vec![invoice_message("m1")]);
    client
        .expect_get_attachment()
        .withf(|message_id, _| message_id == "m1")
        .times(2)
        .returning(|_, attachment_id| Ok(pdf_body(attachment_id)));
    client
        .expect_apply_label()
        .with(eq("m1"), eq(PRINTED_LABEL_ID))
        .times(1)
        .returning(|_, _| Ok(()));

    let printed: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
    let printed_in_mock = printed.clone();
    let mut printer = MockPrinter::new();
    printer.expect_print().times(2).returning(move |path| {
        assert!(path.exists());
        printed_in_mock.lock().unwrap().push(path.to_path_buf());
        Ok(())
    });

    let report = pipeline(client, printer, &spool).run().await.unwrap();

    assert_eq!(report.query, EXPECTED_QUERY);
    assert_eq!(report.messages_matched, 1);
    assert_eq!(report.messages_printed, 1);
    assert_eq!(report.messages_skipped, 0);
    assert_eq!(report.attachments_printed, 2);
    assert!(!report.dry_run);

    let names: Vec<String> = printed
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["invoice.pdf", "receipt.pdf"]);
    assert!(leftover_entries(spool.path()).is_empty());
}

#[tokio::test]
async fn test_already_labeled_message_not_reprinted() {
    let spool = tempdir().unwrap();
    let mut labeled = invoice_message("m1");
    labeled.label_ids.push(PRINTED_LABEL_ID.to_string());

    let mut client = client_with_messages(vec![labeled]);
    client.expect_get_attachment().times(0);
    client.expect_apply_label().times(0);

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let report = pipeline(client, printer, &spool).run().await.unwrap();
    assert_eq!(report.messages_matched, 1);
    assert_eq!(report.messages_skipped, 1);
    assert_eq!(report.messages_printed, 0);
    assert_eq!(report.attachments_printed, 0);
}

#[tokio::test]
async fn test_print_failure_aborts_before_label() {
    let spool = tempdir().unwrap();
    let mut client = client_with_messages(vec![invoice_message("m1")]);
    client
        .expect_get_attachment()
        .with(eq("m1"), eq("att-1"))
        .times(1)
        .returning(|_, attachment_id| Ok(pdf_body(attachment_id)));
    client.expect_apply_label().times(0);

    let mut printer = MockPrinter::new();
    printer.expect_print().times(1).returning(|path| {
        Err(PrinterError::PrintError {
            command: "lp".to_string(),
            path: path.to_path_buf(),
            status: "exit status: 1".to_string(),
        })
    });

    let result = pipeline(client, printer, &spool).run().await;

    assert!(matches!(result, Err(PrinterError::PrintError { .. })));
    assert!(leftover_entries(spool.path()).is_empty());
}

#[tokio::test]
async fn test_failure_stops_remaining_messages() {
    let spool = tempdir().unwrap();
    let mut client = MockMailClient::new();
    client
        .expect_list_labels()
        .returning(|| Ok(vec![printed_label()]));
    client
        .expect_find_messages()
        .returning(|_| Ok(vec![summary("m1"), summary("m2")]));
    client
        .expect_get_message()
        .with(eq("m1"))
        .times(1)
        .returning(|_| Err(PrinterError::NotFound("m1".to_string())));
    client.expect_get_message().with(eq("m2")).times(0);
    client.expect_apply_label().times(0);

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let result = pipeline(client, printer, &spool).run().await;
    assert!(matches!(result, Err(PrinterError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_label_created_once() {
    let spool = tempdir().unwrap();
    let mut client = MockMailClient::new();
    client.expect_list_labels().times(1).returning(|| Ok(vec![]));
    client
        .expect_create_label()
        .with(eq("Printed"))
        .times(1)
        .returning(|_| Ok(printed_label()));
    client
        .expect_find_messages()
        .times(1)
        .returning(|_| Ok(vec![]));

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let report = pipeline(client, printer, &spool).run().await.unwrap();
    assert_eq!(report.messages_matched, 0);
    assert_eq!(report.attachments_printed, 0);
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let spool = tempdir().unwrap();
    let mut client = MockMailClient::new();
    client.expect_list_labels().returning(|| Ok(vec![]));
    client.expect_create_label().times(0);
    client
        .expect_find_messages()
        .with(eq(EXPECTED_QUERY))
        .times(1)
        .returning(|_| Ok(vec![summary("m1")]));
    client
        .expect_get_message()
        .times(1)
        .returning(|id| Ok(invoice_message(id)));
    client.expect_get_attachment().times(0);
    client.expect_apply_label().times(0);

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let report = pipeline(client, printer, &spool)
        .with_dry_run(true)
        .run()
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.messages_matched, 1);
    assert_eq!(report.messages_printed, 0);
    assert_eq!(report.attachments_printed, 0);
}

#[tokio::test]
async fn test_inline_part_printed_without_download() {
    let spool = tempdir().unwrap();
    let mut inline = attachment_part("1", "note.txt");
    inline.body = PartBody {
        attachment_id: None,
        data: Some(b"inline content".to_vec()),
    };
    let message = create_test_message("m1", &["INBOX"], vec![body_part(), inline]);

    let mut client = client_with_messages(vec![message]);
    client.expect_get_attachment().times(0);
    client
        .expect_apply_label()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut printer = MockPrinter::new();
    printer.expect_print().times(1).returning(|path: &Path| {
        assert_eq!(std::fs::read(path).unwrap(), b"inline content");
        Ok(())
    });

    let report = pipeline(client, printer, &spool).run().await.unwrap();
    assert_eq!(report.attachments_printed, 1);
}

#[tokio::test]
async fn test_part_without_content_is_error() {
    let spool = tempdir().unwrap();
    let mut empty = attachment_part("1", "ghost.pdf");
    empty.body = PartBody::default();
    let message = create_test_message("m1", &["INBOX"], vec![empty]);

    let mut client = client_with_messages(vec![message]);
    client.expect_apply_label().times(0);

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let result = pipeline(client, printer, &spool).run().await;
    assert!(matches!(result, Err(PrinterError::AttachmentError(_))));
}

#[tokio::test]
async fn test_message_without_attachments_is_labeled() {
    let spool = tempdir().unwrap();
    let message = create_test_message("m1", &["INBOX"], vec![body_part()]);

    let mut client = client_with_messages(vec![message]);
    client
        .expect_apply_label()
        .with(eq("m1"), eq(PRINTED_LABEL_ID))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut printer = MockPrinter::new();
    printer.expect_print().times(0);

    let report = pipeline(client, printer, &spool).run().await.unwrap();
    assert_eq!(report.messages_printed, 1);
    assert_eq!(report.attachments_printed, 0);
}

#[test]
fn test_api_response_converts_to_message() {
    let response = mock_gmail_message_response("m1", &["invoice.pdf", "receipt.pdf"]);
    let api_message: google_gmail1::api::Message = serde_json::from_value(response).unwrap();

    let message = Message::try_from(api_message).unwrap();
    let candidates: Vec<(&str, Option<&str>)> = message
        .attachment_parts()
        .map(|p| (p.filename.as_str(), p.body.attachment_id.as_deref()))
        .collect();

    assert_eq!(
        candidates,
        vec![("invoice.pdf", Some("att-1")), ("receipt.pdf", Some("att-2"))]
    );
}
