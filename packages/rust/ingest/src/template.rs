//! Campaign body loading.

use std::path::Path;

use tracing::debug;

use contactsync_shared::{ContactSyncError, Result};

/// Read the campaign HTML body from `path`.
///
/// A file that is empty or only whitespace is rejected; sending a blank
/// campaign is never intended.
pub fn load_template(path: &Path) -> Result<String> {
    let body = std::fs::read_to_string(path).map_err(|e| ContactSyncError::io(path, e))?;
    if body.trim().is_empty() {
        return Err(ContactSyncError::validation(format!(
            "campaign template {} is empty",
            path.display()
        )));
    }
    debug!(path = %path.display(), bytes = body.len(), "loaded campaign template");
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fixture_template() {
        let body = load_template(Path::new("../../../fixtures/html/message_template.html"))
            .expect("fixture loads");
        assert!(body.contains("<html"));
    }

    #[test]
    fn blank_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.html");
        std::fs::write(&path, "  \n").unwrap();

        let err = load_template(&path).unwrap_err();
        assert!(matches!(err, ContactSyncError::Validation { .. }));
    }

    #[test]
    fn missing_template_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.html");
        let err = load_template(&path).unwrap_err();
        assert!(err.to_string().contains("none.html"));
    }
}
