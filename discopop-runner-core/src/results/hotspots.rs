//! `hotspot_detection/Hotspots.json`: measured code regions

use super::ArtifactState;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const FILE_NAME: &str = "hotspot_detection/Hotspots.json";

/// Confidence bucket assigned by the hotspot analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Hotness {
    Yes,
    No,
    Maybe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub file_id: u64,
    pub start_line: u32,
    pub hotness: Hotness,
    pub average_runtime: f64,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct Hotspots {
    state: ArtifactState<Vec<Hotspot>>,
}

delegate_artifact!(Hotspots);

impl Hotspots {
    pub fn new(dot_discopop: &Path) -> Self {
        Self { state: ArtifactState::load("hotspots", dot_discopop, parse) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotspot> {
        self.state.data().iter()
    }

    pub fn len(&self) -> usize {
        self.state.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.data().is_empty()
    }
}

#[derive(Deserialize)]
struct Document {
    code_regions: Vec<Value>,
}

#[derive(Deserialize)]
struct RawRegion {
    fid: u64,
    #[serde(rename = "lineNum")]
    line_num: u32,
    hotness: Hotness,
    avr: f64,
}

fn parse(dot_discopop: &Path) -> anyhow::Result<Vec<Hotspot>> {
    let path = dot_discopop.join(FILE_NAME);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;
    let document: Document = serde_json::from_str(&content)
        .with_context(|| format!("{} has no valid `code_regions` list", path.display()))?;

    document
        .code_regions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let region: RawRegion = serde_json::from_value(raw.clone())
                .with_context(|| format!("{}: code region #{}", path.display(), index))?;
            Ok(Hotspot {
                file_id: region.fid,
                start_line: region.line_num,
                hotness: region.hotness,
                average_runtime: region.avr,
                raw,
            })
        })
        .collect()
}
