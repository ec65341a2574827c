//! Input file validation.
//!
//! Runs before any expensive work; a failure here is terminal for the
//! request and guarantees no model load is attempted.

use crate::error::ValidationError;
use std::fs;
use std::path::Path;

/// Maximum accepted input size (500 MiB).
pub const MAX_AUDIO_BYTES: u64 = 500 * 1024 * 1024;

/// Validate that the audio file exists, is non-empty, and is within the
/// size ceiling. Emits one diagnostic line describing the outcome.
pub fn validate(path: &Path) -> Result<(), ValidationError> {
    let meta = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        _ => {
            let err = ValidationError::Missing {
                path: path.to_path_buf(),
            };
            tracing::warn!(error = %err, "validation failed");
            return Err(err);
        }
    };

    match check_len(meta.len(), path) {
        Ok(()) => {
            tracing::info!(
                path = %path.display(),
                size_mb = meta.len() as f64 / (1024.0 * 1024.0),
                "audio file valid"
            );
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = %err, "validation failed");
            Err(err)
        }
    }
}

/// Check a byte length against the empty and ceiling bounds.
fn check_len(len: u64, path: &Path) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::Empty {
            path: path.to_path_buf(),
        });
    }

    if len > MAX_AUDIO_BYTES {
        return Err(ValidationError::TooLarge {
            size_mb: len as f64 / (1024.0 * 1024.0),
            limit_mb: MAX_AUDIO_BYTES / (1024 * 1024),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_file() {
        let result = validate(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(ValidationError::Missing { .. })));
    }

    #[test]
    fn rejects_empty_file() {
        let path = std::env::temp_dir().join("murmur_validate_empty.wav");
        std::fs::write(&path, []).unwrap();

        let result = validate(&path);

        assert!(matches!(result, Err(ValidationError::Empty { .. })));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn accepts_small_file() {
        let path = std::env::temp_dir().join("murmur_validate_ok.wav");
        std::fs::write(&path, [0u8; 64]).unwrap();

        assert!(validate(&path).is_ok());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn length_bounds() {
        let path = Path::new("audio.wav");

        assert!(check_len(1, path).is_ok());
        assert!(check_len(MAX_AUDIO_BYTES, path).is_ok());
        assert!(matches!(
            check_len(MAX_AUDIO_BYTES + 1, path),
            Err(ValidationError::TooLarge { .. })
        ));
        assert!(matches!(
            check_len(0, path),
            Err(ValidationError::Empty { .. })
        ));
    }
}
