//! `patch_applicator/applied_suggestions.json`: currently applied suggestions

use super::ArtifactState;
use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

pub const FILE_NAME: &str = "patch_applicator/applied_suggestions.json";

#[derive(Debug, Clone)]
pub struct AppliedStatus {
    state: ArtifactState<BTreeSet<u64>>,
}

delegate_artifact!(AppliedStatus);

impl AppliedStatus {
    pub fn new(dot_discopop: &Path) -> Self {
        Self { state: ArtifactState::load("applied status", dot_discopop, parse) }
    }

    pub fn is_applied(&self, suggestion_id: u64) -> bool {
        self.state.data().contains(&suggestion_id)
    }

    pub fn applied(&self) -> &BTreeSet<u64> {
        self.state.data()
    }
}

/// The applicator writes ids as strings or as numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Deserialize)]
struct Document {
    applied: Vec<RawId>,
}

fn parse(dot_discopop: &Path) -> anyhow::Result<BTreeSet<u64>> {
    let path = dot_discopop.join(FILE_NAME);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let document: Document = serde_json::from_str(&content)
        .with_context(|| format!("{} has no valid `applied` list", path.display()))?;

    document
        .applied
        .into_iter()
        .map(|id| match id {
            RawId::Number(id) => Ok(id),
            RawId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| anyhow!("{}: applied id {:?} is not a number", path.display(), text)),
        })
        .collect()
}
