//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl StageCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Working directory for both stages.
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    #[serde(default = "default_fetch")]
    pub fetch: StageCommand,
    #[serde(default = "default_train")]
    pub train: StageCommand,
    /// Per-stage timeout in seconds. The child is killed on expiry.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_fetch() -> StageCommand {
    StageCommand::new("python3", &["-u", "dataset/fetch_latest_data.py"])
}

fn default_train() -> StageCommand {
    StageCommand::new("python3", &["-u", "model/train_update.py"])
}

fn default_stage_timeout_secs() -> u64 {
    1800
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            fetch: default_fetch(),
            train: default_train(),
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}
