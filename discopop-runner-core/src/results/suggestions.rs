//! `patterns.json`: parallelization suggestions grouped by pattern type

use super::ArtifactState;
use anyhow::{Context, anyhow, bail};
use regex_utils::location;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const FILE_NAME: &str = "patterns.json";

/// Directories searched for `patterns.json`, first existing wins
pub const SEARCH_ORDER: [&str; 3] = ["", "optimizer", "explorer"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: u64,
    /// Pattern type such as `do_all` or `reduction`
    #[serde(rename = "type")]
    pub kind: String,
    pub file_id: u64,
    pub start_line: u32,
    pub end_line: u32,
    pub applicable: bool,
    pub raw: Value,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SuggestionSet {
    source: Option<PathBuf>,
    by_type: BTreeMap<String, Vec<Suggestion>>,
}

#[derive(Debug, Clone)]
pub struct Suggestions {
    state: ArtifactState<SuggestionSet>,
}

delegate_artifact!(Suggestions);

impl Suggestions {
    pub fn new(dot_discopop: &Path) -> Self {
        Self { state: ArtifactState::load("suggestions", dot_discopop, parse) }
    }

    /// The `patterns.json` that was loaded
    pub fn source(&self) -> Option<&Path> {
        self.state.data().source.as_deref()
    }

    pub fn by_type(&self) -> &BTreeMap<String, Vec<Suggestion>> {
        &self.state.data().by_type
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.state.data().by_type.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.state.data().by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First existing `patterns.json` below `dot_discopop`
pub fn locate(dot_discopop: &Path) -> Option<PathBuf> {
    SEARCH_ORDER
        .iter()
        .map(|dir| dot_discopop.join(dir).join(FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[derive(Deserialize)]
struct Document {
    patterns: BTreeMap<String, Vec<Value>>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    pattern_id: u64,
    start_line: String,
    end_line: String,
    #[serde(default = "applicable_by_default")]
    applicable_pattern: bool,
}

fn applicable_by_default() -> bool {
    true
}

fn parse(dot_discopop: &Path) -> anyhow::Result<SuggestionSet> {
    let Some(path) = locate(dot_discopop) else {
        bail!(
            "no {} in {}, its optimizer/ or its explorer/ directory",
            FILE_NAME,
            dot_discopop.display()
        );
    };
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let document: Document = serde_json::from_str(&content)
        .with_context(|| format!("{} has no valid `patterns` object", path.display()))?;

    let mut by_type = BTreeMap::new();
    for (kind, raws) in document.patterns {
        let suggestions = raws
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                suggestion(&kind, raw)
                    .with_context(|| format!("{}: {} suggestion #{}", path.display(), kind, index))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        by_type.insert(kind, suggestions);
    }

    Ok(SuggestionSet { source: Some(path), by_type })
}

fn suggestion(kind: &str, raw: Value) -> anyhow::Result<Suggestion> {
    let fields: RawSuggestion = serde_json::from_value(raw.clone())?;
    let (file_id, start_line) = location::parse(&fields.start_line)
        .ok_or_else(|| anyhow!("start_line {:?} is not `<fileId>:<lineNr>`", fields.start_line))?;
    let (end_file_id, end_line) = location::parse(&fields.end_line)
        .ok_or_else(|| anyhow!("end_line {:?} is not `<fileId>:<lineNr>`", fields.end_line))?;

    // The start location decides the file
    if end_file_id != file_id {
        warn!(
            "Suggestion {} starts in file {} but ends in file {}, using file {}",
            fields.pattern_id, file_id, end_file_id, file_id
        );
    }

    Ok(Suggestion {
        id: fields.pattern_id,
        kind: kind.to_string(),
        file_id,
        start_line,
        end_line,
        applicable: fields.applicable_pattern,
        raw,
    })
}
