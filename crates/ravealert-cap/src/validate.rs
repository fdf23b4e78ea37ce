//! Content-policy validation for inbound CAP alerts
//!
//! Operators compose messages from a bilingual template whose description
//! holds the English text, a `---` divider, then the French text. An alert
//! is only accepted once both halves of the template have been replaced.
//! This gate runs on ingestion only; outbound building is not policed.

use crate::alert::Alert;
use thiserror::Error;

/// Divider between the English and French halves of a description.
pub const DESCRIPTION_DELIMITER: &str = "---";

const ENGLISH_TEMPLATE: &str = "Insert English text here";
const FRENCH_TEMPLATE: &str = "Insérez le texte français ici";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("alert carries no info block")]
    MissingInfo,

    #[error("description must hold an English and a French part separated by \"---\"")]
    MalformedDescription,

    #[error("description still contains the bilingual template placeholder")]
    UnchangedPlaceholder,
}

/// Validates the first info block of an alert against the bilingual
/// description policy.
///
/// Additional info blocks are permitted but not inspected; delivery targets
/// only consume the first one.
pub fn validate_alert(alert: &Alert) -> Result<(), ValidationError> {
    let info = alert.first_info().ok_or(ValidationError::MissingInfo)?;

    let description = info
        .description
        .as_deref()
        .ok_or(ValidationError::MalformedDescription)?;

    let mut parts = description.split(DESCRIPTION_DELIMITER);
    let (english, french) = match (parts.next(), parts.next(), parts.next()) {
        (Some(english), Some(french), None) => (english, french),
        _ => return Err(ValidationError::MalformedDescription),
    };

    if english.trim_start().starts_with(ENGLISH_TEMPLATE)
        || french.trim_start().starts_with(FRENCH_TEMPLATE)
    {
        return Err(ValidationError::UnchangedPlaceholder);
    }

    Ok(())
}
