//! File-backed analysis results
//!
//! Each artifact parses one file of the result directory and keeps its own
//! validity. Parsing never fails outward: a missing or malformed file clears
//! the artifact and records a message readable through [`ResultArtifact::error`].

// Implements ResultArtifact for a type holding an `ArtifactState` in `state`
macro_rules! delegate_artifact {
    ($artifact:ty) => {
        impl $crate::results::ResultArtifact for $artifact {
            fn update(&mut self, dot_discopop: Option<&std::path::Path>) -> bool {
                self.state.reload(dot_discopop)
            }

            fn valid(&self) -> bool {
                self.state.valid()
            }

            fn error(&self) -> Option<&str> {
                self.state.error()
            }
        }
    };
}

pub(crate) use delegate_artifact;

pub mod applied_status;
pub mod file_mapping;
pub mod hotspots;
pub mod line_mapping;
pub mod manager;
pub mod suggestions;

#[cfg(test)]
mod tests;

pub use applied_status::AppliedStatus;
pub use file_mapping::FileMapping;
pub use hotspots::{Hotness, Hotspot, Hotspots};
pub use line_mapping::LineMapping;
pub use manager::{CombinedHotspot, CombinedSuggestion, ResultManager};
pub use suggestions::{Suggestion, Suggestions};

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Uniform contract of the parsed result files
pub trait ResultArtifact {
    /// Re-parse, from `dot_discopop` when given, else from the last directory used
    fn update(&mut self, dot_discopop: Option<&Path>) -> bool;

    fn valid(&self) -> bool;

    fn error(&self) -> Option<&str>;
}

type Parser<T> = fn(&Path) -> anyhow::Result<T>;

/// Parsed data together with the directory it came from and the last failure
#[derive(Debug, Clone)]
pub(crate) struct ArtifactState<T> {
    name: &'static str,
    directory: PathBuf,
    data: T,
    error: Option<String>,
    parse: Parser<T>,
}

impl<T: Default> ArtifactState<T> {
    pub(crate) fn load(name: &'static str, directory: &Path, parse: Parser<T>) -> Self {
        let mut state =
            Self { name, directory: directory.to_path_buf(), data: T::default(), error: None, parse };
        state.reload(None);
        state
    }

    pub(crate) fn reload(&mut self, directory: Option<&Path>) -> bool {
        if let Some(directory) = directory {
            self.directory = directory.to_path_buf();
        }

        match (self.parse)(&self.directory) {
            Ok(data) => {
                debug!("Parsed {} from {}", self.name, self.directory.display());
                self.data = data;
                self.error = None;
                true
            }
            Err(e) => {
                let message = format!("{e:#}");
                warn!("{} unavailable: {}", self.name, message);
                self.data = T::default();
                self.error = Some(message);
                false
            }
        }
    }

    pub(crate) fn data(&self) -> &T {
        &self.data
    }

    pub(crate) fn valid(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
