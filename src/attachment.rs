//! Spooling attachments to disk for printing

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{PrinterError, Result};
use crate::models::MessagePart;
use crate::printer::Printer;

/// Prefix of the per-attachment spool directories
const SPOOL_PREFIX: &str = "eprinter-";

/// Writes attachments to a scoped spool directory and prints them
///
/// The spool directory lives only for the duration of one
/// [`save_and_print`](Self::save_and_print) call and is removed whether
/// printing succeeded or not.
pub struct AttachmentHandler {
    base_dir: PathBuf,
    printer: Box<dyn Printer>,
}

impl AttachmentHandler {
    pub fn new(base_dir: impl Into<PathBuf>, printer: Box<dyn Printer>) -> Self {
        Self {
            base_dir: base_dir.into(),
            printer,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn save_and_print(&self, message_id: &str, part: &MessagePart, data: &[u8]) -> Result<()> {
        let spool = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempdir_in(&self.base_dir)
            .map_err(|e| {
                PrinterError::AttachmentError(format!(
                    "Cannot create spool directory in {:?}: {}",
                    self.base_dir, e
                ))
            })?;

        let path = spool
            .path()
            .join(sanitize_filename(&part.filename, &part.part_id));
        write_synced(&path, data).await?;
        debug!("Spooled {} bytes to {:?}", data.len(), path);

        self.printer.print(&path).await?;
        info!(
            "Printed attachment '{}' of message {}",
            part.filename, message_id
        );

        // `spool` dropping here removes the file on every path out of this fn
        Ok(())
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

/// Reduce a sender-controlled file name to a single safe path component
///
/// Directory parts are stripped; names that end up empty fall back to
/// `attachment-<part id>`.
pub fn sanitize_filename(filename: &str, part_id: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .replace('\0', "");

    if base.is_empty() || base == "." || base == ".." {
        format!("attachment-{}", part_id)
    } else {
        base
    }
}
