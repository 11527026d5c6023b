//! Precondition checks that gate task creation.
//!
//! Validation runs synchronously on the caller's context, before any worker
//! is spawned. It is the only place with write side effects outside the task
//! itself: a missing output directory is created here (with parents) so the
//! page loop can assume the directory exists.
//!
//! Readability of the source is checked by actually opening it — `exists()`
//! alone would pass files the process cannot read and defer the failure to
//! the middle of a running task.

use crate::error::ValidationError;
use crate::request::{ConversionRequest, ValidatedRequest};
use tracing::debug;

/// Check a request's preconditions and prepare the output directory.
///
/// # Errors
/// * [`ValidationError::InvalidSource`] — source path empty, missing, or unreadable.
/// * [`ValidationError::InvalidOutput`] — output directory path empty.
/// * [`ValidationError::OutputUnwritable`] — output directory absent and creation failed.
pub fn validate(request: &ConversionRequest) -> Result<ValidatedRequest, ValidationError> {
    let source = request.source();

    if source.as_os_str().is_empty() || !source.is_file() {
        return Err(ValidationError::InvalidSource {
            path: source.to_path_buf(),
        });
    }
    if std::fs::File::open(source).is_err() {
        return Err(ValidationError::InvalidSource {
            path: source.to_path_buf(),
        });
    }

    let output_dir = request.output_dir();
    if output_dir.as_os_str().is_empty() {
        return Err(ValidationError::InvalidOutput);
    }

    std::fs::create_dir_all(output_dir).map_err(|e| ValidationError::OutputUnwritable {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    debug!(
        source = %source.display(),
        output_dir = %output_dir.display(),
        "request validated"
    );

    Ok(ValidatedRequest {
        inner: request.clone(),
    })
}
