//! Joins the result artifacts into UI-ready records
//!
//! The combined views are rebuilt after every (re-)parse, never on read.
//! One manager is bound to one result directory; two workflows writing the
//! same directory while a manager reads it are not supported.

use super::{
    AppliedStatus, FileMapping, Hotness, Hotspots, LineMapping, ResultArtifact, Suggestions,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSuggestion {
    pub pattern_id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub file_id: u64,
    pub file_path: PathBuf,
    pub mapped_start_line: u32,
    pub mapped_end_line: u32,
    pub applicable: bool,
    pub applied: bool,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedHotspot {
    pub hotness: Hotness,
    pub file_id: u64,
    pub file_path: PathBuf,
    pub start_line: u32,
    pub average_runtime: f64,
    pub raw: Value,
}

pub struct ResultManager {
    dot_discopop: PathBuf,
    file_mapping: FileMapping,
    line_mapping: LineMapping,
    suggestions: Suggestions,
    hotspots: Hotspots,
    applied_status: AppliedStatus,

    combined_suggestions: BTreeMap<String, Vec<CombinedSuggestion>>,
    combined_hotspots: BTreeMap<Hotness, Vec<CombinedHotspot>>,
}

impl ResultManager {
    /// Parse every artifact below `dot_discopop`
    pub fn new(dot_discopop: impl Into<PathBuf>) -> Self {
        let dot_discopop = dot_discopop.into();
        let mut manager = Self {
            file_mapping: FileMapping::new(&dot_discopop),
            line_mapping: LineMapping::new(&dot_discopop),
            suggestions: Suggestions::new(&dot_discopop),
            hotspots: Hotspots::new(&dot_discopop),
            applied_status: AppliedStatus::new(&dot_discopop),
            dot_discopop,
            combined_suggestions: BTreeMap::new(),
            combined_hotspots: BTreeMap::new(),
        };
        manager.combine();
        manager
    }

    pub fn dot_discopop(&self) -> &Path {
        &self.dot_discopop
    }

    /// Re-parse everything
    pub fn update(&mut self) {
        self.file_mapping.update(None);
        self.line_mapping.update(None);
        self.suggestions.update(None);
        self.hotspots.update(None);
        self.applied_status.update(None);
        self.combine();
    }

    pub fn update_file_mapping(&mut self) -> bool {
        let valid = self.file_mapping.update(None);
        self.combine();
        valid
    }

    pub fn update_line_mapping(&mut self) -> bool {
        let valid = self.line_mapping.update(None);
        self.combine();
        valid
    }

    pub fn update_suggestions(&mut self) -> bool {
        let valid = self.suggestions.update(None);
        self.combine();
        valid
    }

    pub fn update_hotspots(&mut self) -> bool {
        let valid = self.hotspots.update(None);
        self.combine();
        valid
    }

    /// Typically after the patch applicator ran
    pub fn update_applied_status(&mut self) -> bool {
        let valid = self.applied_status.update(None);
        self.combine();
        valid
    }

    pub fn valid_suggestions(&self) -> bool {
        self.file_mapping.valid()
            && self.line_mapping.valid()
            && self.applied_status.valid()
            && self.suggestions.valid()
    }

    /// Applied status plays no part here
    pub fn valid_hotspots(&self) -> bool {
        self.file_mapping.valid() && self.line_mapping.valid() && self.hotspots.valid()
    }

    /// Combined suggestions by pattern type; empty unless [`valid_suggestions`](Self::valid_suggestions)
    pub fn suggestions(&self) -> &BTreeMap<String, Vec<CombinedSuggestion>> {
        &self.combined_suggestions
    }

    /// Combined hotspots by hotness; empty unless [`valid_hotspots`](Self::valid_hotspots)
    pub fn hotspots(&self) -> &BTreeMap<Hotness, Vec<CombinedHotspot>> {
        &self.combined_hotspots
    }

    /// Linear scan over every pattern type
    pub fn suggestion_by_id(&self, pattern_id: u64) -> Option<&CombinedSuggestion> {
        self.combined_suggestions.values().flatten().find(|s| s.pattern_id == pattern_id)
    }

    /// `(artifact, message)` for every artifact that failed to parse
    pub fn errors(&self) -> Vec<(&'static str, String)> {
        let artifacts: [(&'static str, &dyn ResultArtifact); 5] = [
            ("file mapping", &self.file_mapping),
            ("line mapping", &self.line_mapping),
            ("suggestions", &self.suggestions),
            ("hotspots", &self.hotspots),
            ("applied status", &self.applied_status),
        ];
        artifacts
            .into_iter()
            .filter_map(|(name, artifact)| artifact.error().map(|e| (name, e.to_string())))
            .collect()
    }

    pub fn file_mapping(&self) -> &FileMapping {
        &self.file_mapping
    }

    pub fn line_mapping(&self) -> &LineMapping {
        &self.line_mapping
    }

    pub fn raw_suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    pub fn raw_hotspots(&self) -> &Hotspots {
        &self.hotspots
    }

    pub fn applied_status(&self) -> &AppliedStatus {
        &self.applied_status
    }

    fn combine(&mut self) {
        self.combined_suggestions = if self.valid_suggestions() {
            self.combine_suggestions()
        } else {
            BTreeMap::new()
        };
        self.combined_hotspots =
            if self.valid_hotspots() { self.combine_hotspots() } else { BTreeMap::new() };

        debug!(
            "Combined {} suggestion type(s) and {} hotspot bucket(s) from {}",
            self.combined_suggestions.len(),
            self.combined_hotspots.len(),
            self.dot_discopop.display()
        );
    }

    fn combine_suggestions(&self) -> BTreeMap<String, Vec<CombinedSuggestion>> {
        let mut combined: BTreeMap<String, Vec<CombinedSuggestion>> = BTreeMap::new();
        for (kind, suggestions) in self.suggestions.by_type() {
            let entries = combined.entry(kind.clone()).or_default();
            for suggestion in suggestions {
                let Some(file_path) = self.file_mapping.file_path(suggestion.file_id) else {
                    warn!(
                        "Skipping suggestion {}: file id {} is not in the file mapping",
                        suggestion.id, suggestion.file_id
                    );
                    continue;
                };
                entries.push(CombinedSuggestion {
                    pattern_id: suggestion.id,
                    kind: kind.clone(),
                    file_id: suggestion.file_id,
                    file_path: file_path.to_path_buf(),
                    mapped_start_line: self
                        .line_mapping
                        .mapped_line(suggestion.file_id, suggestion.start_line),
                    mapped_end_line: self
                        .line_mapping
                        .mapped_line(suggestion.file_id, suggestion.end_line),
                    applicable: suggestion.applicable,
                    applied: self.applied_status.is_applied(suggestion.id),
                    raw: suggestion.raw.clone(),
                });
            }
        }
        combined
    }

    fn combine_hotspots(&self) -> BTreeMap<Hotness, Vec<CombinedHotspot>> {
        let mut combined: BTreeMap<Hotness, Vec<CombinedHotspot>> = BTreeMap::new();
        for hotspot in self.hotspots.iter() {
            let Some(file_path) = self.file_mapping.file_path(hotspot.file_id) else {
                warn!(
                    "Skipping hotspot at {}:{}: file id is not in the file mapping",
                    hotspot.file_id, hotspot.start_line
                );
                continue;
            };
            combined.entry(hotspot.hotness).or_default().push(CombinedHotspot {
                hotness: hotspot.hotness,
                file_id: hotspot.file_id,
                file_path: file_path.to_path_buf(),
                start_line: self.line_mapping.mapped_line(hotspot.file_id, hotspot.start_line),
                average_runtime: hotspot.average_runtime,
                raw: hotspot.raw.clone(),
            });
        }
        combined
    }
}

impl std::fmt::Debug for ResultManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultManager")
            .field("dot_discopop", &self.dot_discopop)
            .field("valid_suggestions", &self.valid_suggestions())
            .field("valid_hotspots", &self.valid_hotspots())
            .finish()
    }
}
