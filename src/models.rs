use google_gmail1::api;
use serde::{Deserialize, Serialize};

use crate::error::{PrinterError, Result};

/// Part id Gmail gives the textual body of a multipart message
pub const BODY_PART_ID: &str = "0";

/// Search hit: just enough to fetch the full message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub thread_id: Option<String>,
}

/// Full message with its payload parts flattened depth-first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub label_ids: Vec<String>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    pub part_id: String,
    pub filename: String,
    pub mime_type: Option<String>,
    pub body: PartBody,
}

/// Where the bytes of a part live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartBody {
    /// Set when the content must be fetched separately
    pub attachment_id: Option<String>,
    /// Small parts are delivered inline, already decoded
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// Decoded attachment content
#[derive(Debug, Clone, Default)]
pub struct AttachmentBody {
    pub data: Vec<u8>,
}

impl Message {
    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.iter().any(|id| id == label_id)
    }

    /// Parts that should be printed, skipping the textual body
    pub fn attachment_parts(&self) -> impl Iterator<Item = &MessagePart> {
        self.parts.iter().filter(|part| !part.is_body_part())
    }
}

impl MessagePart {
    /// Part "0" always holds the message text, never a real attachment
    pub fn is_body_part(&self) -> bool {
        self.part_id == BODY_PART_ID
    }
}

impl TryFrom<api::Message> for Message {
    type Error = PrinterError;

    fn try_from(msg: api::Message) -> Result<Self> {
        let id = msg
            .id
            .ok_or_else(|| PrinterError::InvalidMessageFormat("Missing message ID".to_string()))?;

        let mut parts = Vec::new();
        if let Some(payload) = msg.payload {
            // The payload root is a container; only its children are parts.
            for part in payload.parts.unwrap_or_default() {
                flatten_part(part, false, &mut parts);
            }
        }

        Ok(Message {
            id,
            label_ids: msg.label_ids.unwrap_or_default(),
            parts,
        })
    }
}

/// Top-level leaves are all kept. Inside nested multiparts (forwarded
/// messages, `multipart/related`) only leaves that are real attachments,
/// carrying a filename or an attachment id, are kept; their text bodies are not.
fn flatten_part(part: api::MessagePart, nested: bool, out: &mut Vec<MessagePart>) {
    let children = part.parts.unwrap_or_default();
    let part_id = part.part_id.unwrap_or_default();

    if !children.is_empty() {
        if part_id == BODY_PART_ID {
            return;
        }
        for child in children {
            flatten_part(child, true, out);
        }
        return;
    }

    let body = part.body.unwrap_or_default();
    let filename = part.filename.unwrap_or_default();
    if nested && filename.is_empty() && body.attachment_id.is_none() {
        return;
    }

    out.push(MessagePart {
        part_id,
        filename,
        mime_type: part.mime_type,
        body: PartBody {
            attachment_id: body.attachment_id,
            data: body.data,
        },
    });
}

impl TryFrom<api::Message> for MessageSummary {
    type Error = PrinterError;

    fn try_from(msg: api::Message) -> Result<Self> {
        let id = msg
            .id
            .ok_or_else(|| PrinterError::InvalidMessageFormat("Missing message ID".to_string()))?;
        Ok(MessageSummary {
            id,
            thread_id: msg.thread_id,
        })
    }
}
