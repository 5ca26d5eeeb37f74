//! CLI command implementations

pub mod chunks;
pub mod config;
pub mod lock;
pub mod nodes;
pub mod split;

pub use chunks::execute as chunks;
pub use config::execute as config;
pub use lock::{status as lock_status, unlock};
pub use nodes::execute as nodes;
pub use split::execute as split;

use crate::address::Axis;
use crate::cli::Cli;
use crate::config::Config;
use crate::workflow::InstanceDirs;
use std::path::PathBuf;

/// Workflow instance a command operates on
#[derive(Debug, Clone)]
pub struct Target {
    pub workflow_dir: PathBuf,
    pub instance: PathBuf,
    pub temps_suffix: String,
}

impl Target {
    /// Command-line flags win over configuration
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            workflow_dir: cli
                .workflow_dir
                .clone()
                .unwrap_or_else(|| config.workflow.dir.clone()),
            instance: PathBuf::from(
                cli.instance
                    .clone()
                    .unwrap_or_else(|| config.workflow.instance.clone()),
            ),
            temps_suffix: config.resources.temps_suffix.clone(),
        }
    }

    pub fn dirs(&self) -> InstanceDirs {
        InstanceDirs::new(&self.workflow_dir, &self.instance)
    }

    /// Human-readable instance label
    pub fn label(&self) -> String {
        if self.instance.as_os_str().is_empty() {
            self.workflow_dir.display().to_string()
        } else {
            format!(
                "{} (instance {})",
                self.workflow_dir.display(),
                self.instance.display()
            )
        }
    }
}

fn parse_axes(names: &[String]) -> Vec<Axis> {
    names.iter().map(|name| Axis::new(name.as_str())).collect()
}
