//! Resolution of the printed label

use tracing::{debug, info};

use crate::client::MailClient;
use crate::error::{PrinterError, Result};
use crate::models::LabelInfo;

/// Return the id of the label named `name`, creating it when missing
///
/// At most one label is created per call.
pub async fn ensure_label(client: &dyn MailClient, name: &str) -> Result<LabelInfo> {
    if let Some(label) = find_label(client, name).await? {
        return Ok(label);
    }

    info!("Creating label: {}", name);
    let label = client.create_label(name).await?;
    if label.id.is_empty() {
        return Err(PrinterError::LabelError(format!(
            "Label '{}' was created without an id",
            name
        )));
    }

    info!("Created label '{}' with ID: {}", label.name, label.id);
    Ok(label)
}

/// Look the label up without creating it
pub async fn find_label(client: &dyn MailClient, name: &str) -> Result<Option<LabelInfo>> {
    let found = client.get_label_by_name(name).await?;
    match &found {
        Some(label) => debug!("Label '{}' exists with ID: {}", label.name, label.id),
        None => debug!("Label '{}' not found", name),
    }
    Ok(found)
}
