//! Search-path lookup for tool binaries

use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Check that `name` resolves to an executable
///
/// Names containing a path separator are checked as files, bare names are
/// searched on `PATH`. With `fail_if_missing` a missing binary becomes
/// [`Error::CommandNotFound`] carrying `hint`.
pub fn command_exists(name: &str, fail_if_missing: bool, hint: &str) -> Result<bool> {
    let found = resolve(name);
    match (&found, fail_if_missing) {
        (Some(path), _) => {
            debug!("Resolved {} to {}", name, path.display());
            Ok(true)
        }
        (None, true) => {
            Err(Error::CommandNotFound { name: name.to_string(), hint: hint.to_string() })
        }
        (None, false) => Ok(false),
    }
}

/// Locate the file a command name refers to
pub fn resolve(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }

        // On Windows, also check for .exe
        if cfg!(windows) {
            let exe = dir.join(format!("{}.exe", name));
            if is_executable(&exe) {
                return Some(exe);
            }
        }
    }

    None
}

/// Regular file with an execute bit (any file on non-Unix platforms)
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    metadata.is_file() && has_execute_bit(&metadata)
}

#[cfg(unix)]
fn has_execute_bit(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bit(_metadata: &std::fs::Metadata) -> bool {
    true
}
