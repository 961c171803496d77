//! Gmail API client used by the print pipeline

use async_trait::async_trait;
use google_gmail1::api::{Label, ModifyMessageRequest};
use tracing::debug;

use crate::auth::{GmailHub, LABELS_SCOPE, MODIFY_SCOPE};
use crate::error::{PrinterError, Result};
use crate::models::{AttachmentBody, LabelInfo, Message, MessageSummary};

/// Gmail's alias for the authenticated account
const USER_ID: &str = "me";

/// Page size for message searches
const PAGE_SIZE: u32 = 100;

/// Trait defining the mailbox operations the pipeline needs, for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Search messages matching a Gmail query, following every result page
    async fn find_messages(&self, query: &str) -> Result<Vec<MessageSummary>>;

    /// Fetch a message with its full payload
    async fn get_message(&self, id: &str) -> Result<Message>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new user label
    async fn create_label(&self, name: &str) -> Result<LabelInfo>;

    /// Add a label to a message; adding a label twice is a no-op
    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;

    /// Download the content of an attachment
    async fn get_attachment(&self, message_id: &str, attachment_id: &str)
        -> Result<AttachmentBody>;

    /// Look a label up by name, case-insensitively
    ///
    /// `Ok(None)` means the label does not exist yet.
    async fn get_label_by_name(&self, name: &str) -> Result<Option<LabelInfo>> {
        let wanted = name.to_lowercase();
        Ok(self
            .list_labels()
            .await?
            .into_iter()
            .find(|label| label.name.to_lowercase() == wanted))
    }
}

/// Production client backed by the `google-gmail1` hub
pub struct GmailMailClient {
    hub: GmailHub,
}

impl GmailMailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl MailClient for GmailMailClient {
    async fn find_messages(&self, query: &str) -> Result<Vec<MessageSummary>> {
        let mut summaries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut call = self
                .hub
                .users()
                .messages_list(USER_ID)
                .q(query)
                .max_results(PAGE_SIZE);

            if let Some(token) = page_token.as_ref() {
                call = call.page_token(token);
            }

            let (_, response) = call.add_scope(MODIFY_SCOPE).doit().await?;

            for msg in response.messages.unwrap_or_default() {
                summaries.push(MessageSummary::try_from(msg)?);
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Query '{}' matched {} messages", query, summaries.len());
        Ok(summaries)
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        debug!("Fetching message {}", id);
        let (_, msg) = self
            .hub
            .users()
            .messages_get(USER_ID, id)
            .format("full")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        Message::try_from(msg)
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        debug!("Calling Gmail API to list labels...");
        let (_, response) = self
            .hub
            .users()
            .labels_list(USER_ID)
            .add_scope(LABELS_SCOPE)
            .doit()
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let label = Label {
            name: Some(name.to_string()),
            message_list_visibility: Some("show".to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            ..Default::default()
        };

        let (_, created) = self
            .hub
            .users()
            .labels_create(label, USER_ID)
            .add_scope(LABELS_SCOPE)
            .doit()
            .await?;

        let id = created
            .id
            .ok_or_else(|| PrinterError::LabelError("Created label has no ID".to_string()))?;

        Ok(LabelInfo {
            id,
            name: created.name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()> {
        let modify_request = ModifyMessageRequest {
            add_label_ids: Some(vec![label_id.to_string()]),
            remove_label_ids: None,
        };

        self.hub
            .users()
            .messages_modify(modify_request, USER_ID, message_id)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        Ok(())
    }

    async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentBody> {
        debug!("Fetching attachment {} of message {}", attachment_id, message_id);
        let (_, body) = self
            .hub
            .users()
            .messages_attachments_get(USER_ID, message_id, attachment_id)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        // The API binding decodes the URL-safe base64 payload while deserializing.
        let data = body.data.ok_or_else(|| {
            PrinterError::AttachmentError(format!(
                "Attachment {} of message {} has no data",
                attachment_id, message_id
            ))
        })?;

        Ok(AttachmentBody { data })
    }
}
