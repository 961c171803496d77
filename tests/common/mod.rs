//! Common test utilities and fixtures

#![allow(dead_code)]

use eprinter::client::MailClient;
use eprinter::config::{Config, PrintConfig};
use eprinter::error::Result;
use eprinter::models::{AttachmentBody, LabelInfo, Message, MessagePart, MessageSummary, PartBody};
use eprinter::printer::Printer;
use mockall::mock;
use serde_json::json;
use std::path::{Path, PathBuf};

pub const PRINTED_LABEL_ID: &str = "Label_1";

/// Configuration with two senders, one subject and the `Printed` label
pub fn create_test_config(program_folder: &Path) -> Config {
    Config {
        program_folder: program_folder.to_path_buf(),
        allowed_emails: vec!["a@x.com".to_string(), "b@x.com".to_string()],
        allowed_email_subjects: vec!["Invoice".to_string()],
        printed_label: "Printed".to_string(),
        print: PrintConfig::default(),
    }
}

pub fn printed_label() -> LabelInfo {
    create_test_label_info(PRINTED_LABEL_ID, "Printed")
}

pub fn create_test_label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn summary(id: &str) -> MessageSummary {
    MessageSummary {
        id: id.to_string(),
        thread_id: Some(format!("thread_{}", id)),
    }
}

/// Part whose content is fetched by attachment id
pub fn attachment_part(part_id: &str, filename: &str) -> MessagePart {
    MessagePart {
        part_id: part_id.to_string(),
        filename: filename.to_string(),
        mime_type: Some("application/pdf".to_string()),
        body: PartBody {
            attachment_id: Some(format!("att-{}", part_id)),
            data: None,
        },
    }
}

/// Part "0": the textual body of the message
pub fn body_part() -> MessagePart {
    MessagePart {
        part_id: "0".to_string(),
        filename: String::new(),
        mime_type: Some("text/plain".to_string()),
        body: PartBody {
            attachment_id: None,
            data: Some(b"Please find the invoice attached".to_vec()),
        },
    }
}

pub fn create_test_message(id: &str, label_ids: &[&str], parts: Vec<MessagePart>) -> Message {
    Message {
        id: id.to_string(),
        label_ids: label_ids.iter().map(|l| l.to_string()).collect(),
        parts,
    }
}

/// Message with body part "0" and two PDF attachments "1" and "2"
pub fn invoice_message(id: &str) -> Message {
    create_test_message(
        id,
        &["INBOX"],
        vec![
            body_part(),
            attachment_part("1", "invoice.pdf"),
            attachment_part("2", "receipt.pdf"),
        ],
    )
}

pub fn pdf_body(attachment_id: &str) -> AttachmentBody {
    AttachmentBody {
        data: format!("%PDF-1.4 {}", attachment_id).into_bytes(),
    }
}

/// Gmail API `users.messages.get` response in full format (JSON)
pub fn mock_gmail_message_response(id: &str, filenames: &[&str]) -> serde_json::Value {
    let mut parts = vec![json!({
        "partId": "0",
        "mimeType": "text/plain",
        "filename": "",
        "body": { "size": 0 }
    })];
    for (index, filename) in filenames.iter().enumerate() {
        let part_id = (index + 1).to_string();
        parts.push(json!({
            "partId": part_id,
            "mimeType": "application/pdf",
            "filename": filename,
            "body": { "attachmentId": format!("att-{}", part_id), "size": 1024 }
        }));
    }

    json!({
        "id": id,
        "threadId": format!("thread_{}", id),
        "labelIds": ["INBOX", "UNREAD"],
        "payload": {
            "partId": "",
            "mimeType": "multipart/mixed",
            "filename": "",
            "parts": parts
        }
    })
}

/// Files that remain in a spool base directory
pub fn leftover_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait::async_trait]
    impl MailClient for MailClient {
        async fn find_messages(&self, query: &str) -> Result<Vec<MessageSummary>>;
        async fn get_message(&self, id: &str) -> Result<Message>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<LabelInfo>;
        async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;
        async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<AttachmentBody>;
    }
}

// Mock implementation of Printer for testing
mock! {
    pub Printer {}

    #[async_trait::async_trait]
    impl Printer for Printer {
        async fn print(&self, path: &Path) -> Result<()>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_message_candidates() {
        let msg = invoice_message("m1");
        let ids: Vec<&str> = msg.attachment_parts().map(|p| p.part_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_mock_gmail_message_response() {
        let response = mock_gmail_message_response("msg1", &["a.pdf"]);
        assert_eq!(response["id"], "msg1");
        assert_eq!(response["payload"]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(response["payload"]["parts"][1]["body"]["attachmentId"], "att-1");
    }
}
