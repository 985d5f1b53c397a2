//! `FileMapping.txt`: file ids of the instrumented sources

use super::ArtifactState;
use anyhow::{Context, bail};
use regex_utils::file_mapping::parse_line;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "FileMapping.txt";

#[derive(Debug, Clone, Default)]
pub(crate) struct Mapping {
    paths: BTreeMap<u64, PathBuf>,
    ids: HashMap<PathBuf, u64>,
}

/// Bijection between file ids and source paths
#[derive(Debug, Clone)]
pub struct FileMapping {
    state: ArtifactState<Mapping>,
}

delegate_artifact!(FileMapping);

impl FileMapping {
    pub fn new(dot_discopop: &Path) -> Self {
        Self { state: ArtifactState::load("file mapping", dot_discopop, parse) }
    }

    pub fn file_path(&self, file_id: u64) -> Option<&Path> {
        self.state.data().paths.get(&file_id).map(PathBuf::as_path)
    }

    pub fn file_id(&self, path: &Path) -> Option<u64> {
        self.state.data().ids.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.state.data().paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.data().paths.is_empty()
    }

    /// Entries ordered by id
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Path)> {
        self.state.data().paths.iter().map(|(id, path)| (*id, path.as_path()))
    }
}

fn parse(dot_discopop: &Path) -> anyhow::Result<Mapping> {
    let path = dot_discopop.join(FILE_NAME);
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("cannot read {}", path.display()))?;

    let mut mapping = Mapping::default();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((id, file)) = parse_line(line) else {
            bail!("{}:{}: expected `<id><TAB><path>`, found {:?}", path.display(), number + 1, line);
        };
        let file = PathBuf::from(file);

        if mapping.paths.contains_key(&id) {
            bail!("{}:{}: file id {} appears twice", path.display(), number + 1, id);
        }
        if let Some(previous) = mapping.ids.get(&file) {
            bail!(
                "{}:{}: {} already has file id {}",
                path.display(),
                number + 1,
                file.display(),
                previous
            );
        }

        mapping.ids.insert(file.clone(), id);
        mapping.paths.insert(id, file);
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ResultArtifact;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn mapping_from(content: &str) -> (TempDir, FileMapping) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), content).unwrap();
        let mapping = FileMapping::new(dir.path());
        (dir, mapping)
    }

    #[test]
    fn test_parse_with_blank_lines_and_padding() {
        let (_dir, mapping) = mapping_from("1\t/src/main.c\n\n  2\t/src/util dir/util.c  \n");
        assert!(mapping.valid());
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.file_path(2), Some(Path::new("/src/util dir/util.c")));
        assert_eq!(mapping.file_id(Path::new("/src/main.c")), Some(1));
        assert_eq!(mapping.file_path(3), None);
    }

    #[test]
    fn test_missing_file_is_an_error_state() {
        let dir = TempDir::new().unwrap();
        let mapping = FileMapping::new(dir.path());
        assert!(!mapping.valid());
        assert!(mapping.error().unwrap().contains("FileMapping.txt"));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_malformed_line() {
        let (_dir, mapping) = mapping_from("1\t/src/main.c\n2 /src/util.c\n");
        assert!(!mapping.valid());
        assert!(mapping.error().unwrap().contains(":2:"));
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_duplicates_break_the_bijection() {
        let (_dir, ids) = mapping_from("1\t/src/a.c\n1\t/src/b.c\n");
        assert!(ids.error().unwrap().contains("file id 1 appears twice"));

        let (_dir, paths) = mapping_from("1\t/src/a.c\n2\t/src/a.c\n");
        assert!(paths.error().unwrap().contains("already has file id 1"));
    }

    #[test]
    fn test_update_recovers_and_clears() {
        let (dir, mut mapping) = mapping_from("garbage\n");
        assert!(!mapping.valid());

        std::fs::write(dir.path().join(FILE_NAME), "7\t/src/main.c\n").unwrap();
        assert!(mapping.update(None));
        assert_eq!(mapping.file_path(7), Some(Path::new("/src/main.c")));

        let empty = TempDir::new().unwrap();
        assert!(!mapping.update(Some(empty.path())));
        assert_eq!(mapping.file_path(7), None);
    }

    proptest! {
        #[test]
        fn prop_round_trip_is_a_bijection(
            paths in prop::collection::btree_set("/[a-z]{1,8}(/[a-z_ ]{1,8}){0,3}\\.(c|cpp|h)", 0..40),
            offset in 0u64..1000,
        ) {
            let entries: Vec<(u64, String)> =
                paths.into_iter().enumerate().map(|(i, path)| (offset + 3 * i as u64, path)).collect();
            let content: String =
                entries.iter().map(|(id, path)| format!("{id}\t{path}\n")).collect();
            let (_dir, mapping) = mapping_from(&content);

            prop_assert!(mapping.valid());
            prop_assert_eq!(mapping.len(), entries.len());
            for (id, path) in &entries {
                prop_assert_eq!(mapping.file_path(*id), Some(Path::new(path)));
                prop_assert_eq!(mapping.file_id(Path::new(path)), Some(*id));
            }
        }
    }
}
