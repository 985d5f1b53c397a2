use super::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

struct ResultDir {
    dir: TempDir,
}

impl ResultDir {
    fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }

    /// The scenario: main.c with one do_all suggestion from line 10 to 20
    fn scenario() -> Self {
        let results = Self::new();
        results
            .write(file_mapping::FILE_NAME, "0\tmain.c\n")
            .write(
                suggestions::FILE_NAME,
                &json!({"patterns": {"do_all": [
                    {"pattern_id": 1, "start_line": "0:10", "end_line": "0:20"}
                ]}})
                .to_string(),
            )
            .write(applied_status::FILE_NAME, r#"{"applied":[]}"#)
            .write(line_mapping::FILE_NAME, r#"{"0": {"10": 12}}"#)
            .write(
                hotspots::FILE_NAME,
                &json!({"code_regions": [
                    {"fid": 0, "lineNum": 10, "hotness": "YES", "avr": 0.9},
                    {"fid": 0, "lineNum": 30, "hotness": "NO", "avr": 0.01}
                ]})
                .to_string(),
            );
        results
    }
}

#[test]
fn test_end_to_end_scenario() {
    let results = ResultDir::scenario();
    let manager = ResultManager::new(results.path());

    assert!(manager.valid_suggestions());
    assert!(manager.errors().is_empty());

    let suggestions = manager.suggestions();
    assert_eq!(suggestions.len(), 1);
    let do_all = &suggestions["do_all"];
    assert_eq!(do_all.len(), 1);

    let suggestion = &do_all[0];
    assert_eq!(suggestion.pattern_id, 1);
    assert_eq!(suggestion.kind, "do_all");
    assert_eq!(suggestion.file_path, Path::new("main.c"));
    assert_eq!(suggestion.mapped_start_line, 12);
    assert_eq!(suggestion.mapped_end_line, 20);
    assert!(suggestion.applicable);
    assert!(!suggestion.applied);
}

#[test]
fn test_hotspots_are_bucketed_by_hotness() {
    let results = ResultDir::scenario();
    let manager = ResultManager::new(results.path());

    assert!(manager.valid_hotspots());
    let hotspots = manager.hotspots();
    assert_eq!(hotspots[&Hotness::Yes].len(), 1);
    assert_eq!(hotspots[&Hotness::Yes][0].start_line, 12);
    assert_eq!(hotspots[&Hotness::No][0].start_line, 30);
    assert!(!hotspots.contains_key(&Hotness::Maybe));
}

#[test]
fn test_valid_suggestions_truth_table() {
    let artifacts = [
        file_mapping::FILE_NAME,
        line_mapping::FILE_NAME,
        applied_status::FILE_NAME,
        suggestions::FILE_NAME,
    ];

    for mask in 0u8..16 {
        let results = ResultDir::scenario();
        for (bit, file) in artifacts.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                results.write(file, "{ not valid");
            }
        }

        let manager = ResultManager::new(results.path());
        let expected = mask == 0;
        assert_eq!(manager.valid_suggestions(), expected, "mask {mask:04b}");
        assert_eq!(manager.suggestions().is_empty(), !expected, "mask {mask:04b}");
        assert_eq!(manager.errors().len(), mask.count_ones() as usize, "mask {mask:04b}");
    }
}

#[test]
fn test_hotspots_ignore_applied_status() {
    let results = ResultDir::scenario();
    results.write(applied_status::FILE_NAME, "broken");
    let manager = ResultManager::new(results.path());

    assert!(!manager.valid_suggestions());
    assert!(manager.valid_hotspots());
    assert!(!manager.hotspots().is_empty());
    assert_eq!(manager.errors().len(), 1);
    assert_eq!(manager.errors()[0].0, "applied status");
}

#[test]
fn test_invalid_line_mapping_gates_hotspots() {
    let results = ResultDir::scenario();
    results.write(line_mapping::FILE_NAME, "[]");
    let manager = ResultManager::new(results.path());

    assert!(!manager.valid_hotspots());
    assert!(manager.hotspots().is_empty());
}

#[test]
fn test_selective_update_recomputes_combined_views() {
    let results = ResultDir::scenario();
    let mut manager = ResultManager::new(results.path());
    assert!(!manager.suggestion_by_id(1).unwrap().applied);

    results.write(applied_status::FILE_NAME, r#"{"applied":["1"]}"#);
    assert!(!manager.suggestion_by_id(1).unwrap().applied);
    assert!(manager.update_applied_status());
    assert!(manager.suggestion_by_id(1).unwrap().applied);

    std::fs::remove_file(results.path().join(file_mapping::FILE_NAME)).unwrap();
    assert!(!manager.update_file_mapping());
    assert!(manager.suggestions().is_empty());
    assert!(manager.hotspots().is_empty());

    results.write(file_mapping::FILE_NAME, "0\tsrc/main.c\n");
    manager.update();
    assert_eq!(manager.suggestion_by_id(1).unwrap().file_path, Path::new("src/main.c"));
}

#[test]
fn test_unknown_file_ids_are_skipped() {
    let results = ResultDir::scenario();
    results.write(
        suggestions::FILE_NAME,
        &json!({"patterns": {
            "do_all": [{"pattern_id": 1, "start_line": "0:10", "end_line": "0:20"}],
            "reduction": [{"pattern_id": 2, "start_line": "5:1", "end_line": "5:3"}]
        }})
        .to_string(),
    );
    let manager = ResultManager::new(results.path());

    assert!(manager.valid_suggestions());
    assert!(manager.suggestion_by_id(1).is_some());
    assert!(manager.suggestion_by_id(2).is_none());
    assert!(manager.suggestions()["reduction"].is_empty());
}

#[test]
fn test_suggestion_lookup_across_types() {
    let results = ResultDir::scenario();
    results.write(
        suggestions::FILE_NAME,
        &json!({"patterns": {
            "do_all": [{"pattern_id": 1, "start_line": "0:10", "end_line": "0:20"}],
            "simple_gpu": [{"pattern_id": 9, "start_line": "0:40", "end_line": "0:48", "applicable_pattern": false}]
        }})
        .to_string(),
    );
    let manager = ResultManager::new(results.path());

    let gpu = manager.suggestion_by_id(9).unwrap();
    assert_eq!(gpu.kind, "simple_gpu");
    assert!(!gpu.applicable);
    assert_eq!(gpu.mapped_start_line, 40);
    assert!(manager.suggestion_by_id(10).is_none());
}

#[test]
fn test_combined_records_serialize() {
    let results = ResultDir::scenario();
    let manager = ResultManager::new(results.path());

    let value = serde_json::to_value(manager.suggestion_by_id(1).unwrap()).unwrap();
    assert_eq!(value["type"], "do_all");
    assert_eq!(value["file_path"], "main.c");
    assert_eq!(value["mapped_start_line"], 12);

    let hotspot = serde_json::to_value(&manager.hotspots()[&Hotness::Yes][0]).unwrap();
    assert_eq!(hotspot["hotness"], "YES");
}

#[test]
fn test_empty_directory_is_entirely_invalid() {
    let results = ResultDir::new();
    let manager = ResultManager::new(results.path());

    assert!(!manager.valid_suggestions());
    assert!(!manager.valid_hotspots());
    assert_eq!(manager.errors().len(), 5);
}
