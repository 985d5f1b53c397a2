//! Runner settings
//!
//! Every field carries a documented default; a settings file only needs to
//! mention what it overrides.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level settings for the runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Workflow behaviour
    pub workflow: WorkflowSettings,

    /// Names or paths of the external analysis tools
    pub tools: ToolCommands,

    /// Build tooling used by the instrumentation
    pub build: BuildSettings,

    /// Process execution
    pub execution: ExecutionSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowSettings {
    /// Wipe an existing build directory without asking
    pub skip_overwrite_confirmation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolCommands {
    pub config_provider: String,
    pub explorer: String,
    pub optimizer: String,
    pub patch_generator: String,
    pub patch_applicator: String,
    pub hotspot_analyzer: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            config_provider: "discopop_config_provider".to_string(),
            explorer: "discopop_explorer".to_string(),
            optimizer: "discopop_optimizer".to_string(),
            patch_generator: "discopop_patch_generator".to_string(),
            patch_applicator: "discopop_patch_applicator".to_string(),
            hotspot_analyzer: "hotspot_analyzer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    /// Build tool invoked in the build directory
    pub make_command: String,

    /// Environment variable through which the instrumented toolchain finds the result directory
    pub result_env_var: String,

    /// Absolute path of the DiscoPoP CMake wrapper; looked up through the config provider when unset
    pub cmake_wrapper: Option<PathBuf>,

    /// Absolute path of the hotspot-detection CMake wrapper
    pub hotspot_cmake_wrapper: Option<PathBuf>,

    /// File name of the DiscoPoP wrapper below `<discopop build>/scripts`
    pub cmake_wrapper_name: String,

    /// File name of the hotspot-detection wrapper below `<discopop build>/scripts`
    pub hotspot_cmake_wrapper_name: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            make_command: "make".to_string(),
            result_env_var: "DOT_DISCOPOP".to_string(),
            cmake_wrapper: None,
            hotspot_cmake_wrapper: None,
            cmake_wrapper_name: "CMAKE_wrapper.sh".to_string(),
            hotspot_cmake_wrapper_name: "HOTSPOT_CMAKE_wrapper.sh".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSettings {
    /// Time a process gets to exit after the termination signal before it is killed
    pub kill_grace_period_ms: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self { kill_grace_period_ms: 5000 }
    }
}

impl ExecutionSettings {
    pub fn kill_grace_period(&self) -> Duration {
        Duration::from_millis(self.kill_grace_period_ms)
    }
}

impl RunnerConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the file when it exists, otherwise fall back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert!(!config.workflow.skip_overwrite_confirmation);
        assert_eq!(config.tools.explorer, "discopop_explorer");
        assert_eq!(config.tools.hotspot_analyzer, "hotspot_analyzer");
        assert_eq!(config.build.make_command, "make");
        assert_eq!(config.build.result_env_var, "DOT_DISCOPOP");
        assert_eq!(config.execution.kill_grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_overrides_single_fields() {
        let config: RunnerConfig = toml::from_str(
            r#"
            [workflow]
            skip_overwrite_confirmation = true

            [tools]
            optimizer = "/opt/discopop/bin/discopop_optimizer"
            "#,
        )
        .unwrap();

        assert!(config.workflow.skip_overwrite_confirmation);
        assert_eq!(config.tools.optimizer, "/opt/discopop/bin/discopop_optimizer");
        assert_eq!(config.tools.explorer, "discopop_explorer");
        assert_eq!(config.build, BuildSettings::default());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let parsed: std::result::Result<RunnerConfig, _> =
            toml::from_str("[workflow]\nskip_confirmation = true\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runner.toml");

        let mut config = RunnerConfig::default();
        config.build.cmake_wrapper = Some(PathBuf::from("/opt/discopop/build/scripts/CMAKE_wrapper.sh"));
        config.execution.kill_grace_period_ms = 250;
        config.save(&path).unwrap();

        assert_eq!(RunnerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RunnerConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, RunnerConfig::default());
    }
}
