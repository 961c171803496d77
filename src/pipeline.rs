//! The print run: search, fetch, print, label

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::attachment::AttachmentHandler;
use crate::client::MailClient;
use crate::config::Config;
use crate::error::{PrinterError, Result};
use crate::labels;
use crate::models::{LabelInfo, Message, MessagePart};
use crate::query::build_search_query;

/// Summary of one completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub query: String,
    /// Messages returned by the search
    pub messages_matched: usize,
    /// Messages whose attachments were all printed and that got labeled
    pub messages_printed: usize,
    /// Messages skipped because they already carried the printed label
    pub messages_skipped: usize,
    pub attachments_printed: usize,
    pub dry_run: bool,
}

/// Sequential print pipeline over a mailbox
///
/// Any error aborts the run at the point it happens. A message is only
/// labeled after every one of its attachments was printed, so an aborted
/// message is picked up again by the next run.
pub struct PrintPipeline {
    client: Arc<dyn MailClient>,
    handler: AttachmentHandler,
    config: Config,
    dry_run: bool,
}

impl PrintPipeline {
    pub fn new(client: Arc<dyn MailClient>, handler: AttachmentHandler, config: Config) -> Self {
        Self {
            client,
            handler,
            config,
            dry_run: false,
        }
    }

    /// Search and fetch only: nothing is created, printed or labeled
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            query: build_search_query(
                &self.config.allowed_emails,
                &self.config.allowed_email_subjects,
                &self.config.printed_label,
            ),
            messages_matched: 0,
            messages_printed: 0,
            messages_skipped: 0,
            attachments_printed: 0,
            dry_run: self.dry_run,
        };
        info!("Starting run {}", report.run_id);

        let label = self.resolve_label().await?;

        info!("Searching messages: {}", report.query);
        let summaries = self.client.find_messages(&report.query).await?;
        report.messages_matched = summaries.len();
        info!("Found {} matching messages", summaries.len());

        for summary in summaries {
            let message = self.client.get_message(&summary.id).await?;

            if let Some(label) = &label {
                if message.has_label(&label.id) {
                    warn!(
                        "Message {} already labeled '{}', skipping",
                        message.id, label.name
                    );
                    report.messages_skipped += 1;
                    continue;
                }
            }

            report.attachments_printed += self.print_message(&message).await?;

            match &label {
                Some(label) if !self.dry_run => {
                    self.client.apply_label(&message.id, &label.id).await?;
                    info!("Message {} labeled as '{}'", message.id, label.name);
                    report.messages_printed += 1;
                }
                _ => debug!("Dry run: message {} left unlabeled", message.id),
            }
        }

        report.completed_at = Utc::now();
        info!(
            "Run {} finished: {} matched, {} printed, {} skipped, {} attachments",
            report.run_id,
            report.messages_matched,
            report.messages_printed,
            report.messages_skipped,
            report.attachments_printed
        );
        Ok(report)
    }

    /// The label is only created when the run may write to the mailbox
    async fn resolve_label(&self) -> Result<Option<LabelInfo>> {
        let name = &self.config.printed_label;
        if self.dry_run {
            let found = labels::find_label(self.client.as_ref(), name).await?;
            if found.is_none() {
                info!("Dry run: label '{}' does not exist and would be created", name);
            }
            Ok(found)
        } else {
            labels::ensure_label(self.client.as_ref(), name).await.map(Some)
        }
    }

    /// Print every candidate part of `message`, returning how many were sent
    async fn print_message(&self, message: &Message) -> Result<usize> {
        let mut printed = 0;

        for part in message.attachment_parts() {
            if self.dry_run {
                info!(
                    "Dry run: would print '{}' (part {}) of message {}",
                    part.filename, part.part_id, message.id
                );
                continue;
            }

            let data = self.attachment_data(&message.id, part).await?;
            self.handler.save_and_print(&message.id, part, &data).await?;
            printed += 1;
        }

        Ok(printed)
    }

    async fn attachment_data(&self, message_id: &str, part: &MessagePart) -> Result<Vec<u8>> {
        if let Some(attachment_id) = &part.body.attachment_id {
            return Ok(self
                .client
                .get_attachment(message_id, attachment_id)
                .await?
                .data);
        }

        part.body.data.clone().ok_or_else(|| {
            PrinterError::AttachmentError(format!(
                "Part {} of message {} has neither an attachment id nor inline data",
                part.part_id, message_id
            ))
        })
    }
}
