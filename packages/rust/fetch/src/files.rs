//! Local file reading for file-pattern tokens.

use std::path::PathBuf;

use tracing::{debug, instrument};

use agency_shared::{AgencyError, Result};

/// Expand `pattern` and return the matched files' contents joined by `"\n"`,
/// in match order (alphabetical).
///
/// Invalid UTF-8 is replaced, not rejected.
/// A pattern matching nothing yields an empty string. A malformed pattern,
/// an unreadable directory entry, or an unreadable file is an error.
#[instrument]
pub fn fetch_file(pattern: &str) -> Result<String> {
    let paths = glob::glob(pattern).map_err(|e| AgencyError::pattern(pattern, e.msg))?;

    let mut contents = Vec::new();
    for entry in paths {
        let path: PathBuf = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            AgencyError::io(path, e.into_error())
        })?;
        let bytes = std::fs::read(&path).map_err(|e| AgencyError::io(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "read file");
        contents.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    Ok(contents.join("\n"))
}
