use crate::core::dev_process::ProcessSpec;
use crate::utils::error::{DevReadyError, Result};
use crate::utils::validation::{
    compile_pattern, validate_non_empty_string, validate_relative_path, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WAIT_MS: u64 = 1000;
pub const DEFAULT_POLL_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: ScenarioMeta,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    pub name: String,
    pub description: Option<String>,
    pub project_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub ready_pattern: Option<String>,
    pub ready_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepConfig {
    /// Replace a file in the project, e.g. to trigger a rebuild.
    WriteFile { path: String, contents: String },
    WaitForLog {
        process: String,
        pattern: String,
        timeout_ms: Option<u64>,
    },
    /// Poll a page until its body contains `contains`.
    ExpectHttp {
        url: String,
        contains: String,
        timeout_ms: Option<u64>,
        interval_ms: Option<u64>,
    },
    Sleep { ms: u64 },
}

impl ProcessConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms.unwrap_or(DEFAULT_WAIT_MS))
    }

    pub fn to_spec(&self, cwd: &Path) -> ProcessSpec {
        ProcessSpec {
            name: self.name.clone(),
            program: self.command.clone(),
            args: self.args.clone(),
            cwd: Some(cwd.to_path_buf()),
            env: self.env.clone(),
        }
    }
}

impl ScenarioConfig {
    /// 從 TOML 檔案載入情境
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${APP_PORT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = compile_pattern("env_placeholder", r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn project_dir(&self) -> PathBuf {
        PathBuf::from(&self.scenario.project_dir)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("scenario.name", &self.scenario.name)?;
        validate_non_empty_string("scenario.project_dir", &self.scenario.project_dir)?;

        for file in &self.files {
            validate_relative_path("files.path", &file.path)?;
        }

        let mut names = HashSet::new();
        for process in &self.processes {
            validate_non_empty_string("processes.name", &process.name)?;
            validate_non_empty_string("processes.command", &process.command)?;
            if !names.insert(process.name.as_str()) {
                return Err(DevReadyError::InvalidConfigValue {
                    field: "processes.name".to_string(),
                    value: process.name.clone(),
                    reason: "Process names must be unique".to_string(),
                });
            }
            if let Some(pattern) = &process.ready_pattern {
                compile_pattern("processes.ready_pattern", pattern)?;
            }
        }

        for step in &self.steps {
            match step {
                StepConfig::WriteFile { path, .. } => {
                    validate_relative_path("steps.path", path)?;
                }
                StepConfig::WaitForLog {
                    process, pattern, ..
                } => {
                    if !names.contains(process.as_str()) {
                        return Err(DevReadyError::InvalidConfigValue {
                            field: "steps.process".to_string(),
                            value: process.clone(),
                            reason: "No process with this name".to_string(),
                        });
                    }
                    compile_pattern("steps.pattern", pattern)?;
                }
                StepConfig::ExpectHttp { url, .. } => validate_url("steps.url", url)?,
                StepConfig::Sleep { .. } => {}
            }
        }

        Ok(())
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
