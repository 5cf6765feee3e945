/// Work invariant validation
///
/// The structural gate every mutation passes before its transaction commits,
/// plus the field checks applied to incoming requests.
use crate::db::Work;
use crate::error::WorkError;
use crate::work_store::models::WorkFields;
use std::fmt;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum description length in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Maximum length of a link or social handle in characters
pub const MAX_URL_LENGTH: usize = 2048;

/// Broken structural invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    MissingMainContent,
    MissingTargetFile,
}

impl Violation {
    pub fn reason(&self) -> &'static str {
        match self {
            Violation::MissingMainContent => {
                "A work must have main content (image or video) to be shared"
            }
            Violation::MissingTargetFile => "A work must have a target file for augmented reality",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl From<Violation> for WorkError {
    fn from(violation: Violation) -> Self {
        WorkError::StructuralViolation(violation.reason().to_string())
    }
}

fn is_missing(url: &Option<String>) -> bool {
    url.as_deref().map(str::trim).map_or(true, str::is_empty)
}

/// Check the mandatory file slots of a post-mutation row
pub fn validate(work: &Work) -> Result<(), Violation> {
    if is_missing(&work.main_content_url) {
        return Err(Violation::MissingMainContent);
    }

    if is_missing(&work.target_file_url) {
        return Err(Violation::MissingTargetFile);
    }

    Ok(())
}

/// Field validation error detail
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validate caller-supplied fields
pub fn validate_fields(fields: &WorkFields) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = fields.title.trim();
    if title.is_empty() {
        errors.push(FieldError {
            field: "title".to_string(),
            message: "Title is required".to_string(),
        });
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(FieldError {
            field: "title".to_string(),
            message: format!("Title exceeds {} characters", MAX_TITLE_LENGTH),
        });
    }

    if fields.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        errors.push(FieldError {
            field: "description".to_string(),
            message: format!("Description exceeds {} characters", MAX_DESCRIPTION_LENGTH),
        });
    }

    for (i, link) in fields.links.iter().enumerate() {
        if link.chars().count() > MAX_URL_LENGTH {
            errors.push(FieldError {
                field: format!("links[{}]", i),
                message: format!("Link exceeds {} characters", MAX_URL_LENGTH),
            });
        }
    }

    for (i, entry) in fields.social_entries.iter().enumerate() {
        if entry.handle_or_url.chars().count() > MAX_URL_LENGTH {
            errors.push(FieldError {
                field: format!("social_entries[{}]", i),
                message: format!("Handle exceeds {} characters", MAX_URL_LENGTH),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Collapse field errors into a single validation error
pub fn into_work_error(errors: Vec<FieldError>) -> WorkError {
    let message = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    WorkError::Validation(message)
}
