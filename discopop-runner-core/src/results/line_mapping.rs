//! `line_mapping.json`: line numbers of the rewritten sources mapped back

use super::ArtifactState;
use anyhow::Context;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

pub const FILE_NAME: &str = "line_mapping.json";

type Lines = BTreeMap<u64, BTreeMap<u32, u32>>;

#[derive(Debug, Clone)]
pub struct LineMapping {
    state: ArtifactState<Lines>,
}

delegate_artifact!(LineMapping);

impl LineMapping {
    pub fn new(dot_discopop: &Path) -> Self {
        Self { state: ArtifactState::load("line mapping", dot_discopop, parse) }
    }

    /// Rewritten line for `line`, or `line` itself when no entry exists
    pub fn mapped_line(&self, file_id: u64, line: u32) -> u32 {
        match self.state.data().get(&file_id).and_then(|lines| lines.get(&line)) {
            Some(mapped) => *mapped,
            None => {
                debug!("No line mapping for {}:{}, keeping the original line", file_id, line);
                line
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.data().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse(dot_discopop: &Path) -> anyhow::Result<Lines> {
    let path = dot_discopop.join(FILE_NAME);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let raw: HashMap<String, HashMap<String, u32>> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a line mapping", path.display()))?;

    let mut lines = Lines::new();
    for (file_id, entries) in raw {
        let file_id: u64 = file_id
            .trim()
            .parse()
            .with_context(|| format!("{}: file id {:?} is not a number", path.display(), file_id))?;
        let file_lines = lines.entry(file_id).or_default();
        for (line, mapped) in entries {
            let line: u32 = line.trim().parse().with_context(|| {
                format!("{}: line {:?} of file {} is not a number", path.display(), line, file_id)
            })?;
            file_lines.insert(line, mapped);
        }
    }

    Ok(lines)
}
