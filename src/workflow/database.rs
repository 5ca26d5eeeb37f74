//! Per-instance workflow database

use crate::error::PipedbResult;
use crate::nodes::NodeManager;
use crate::resources::ResourceManager;
use std::path::{Path, PathBuf};

/// On-disk locations of one workflow instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDirs {
    pub db: PathBuf,
    pub nodes: PathBuf,
    pub temps: PathBuf,
    pub logs: PathBuf,
}

impl InstanceDirs {
    /// `<workflow_dir>/{db,nodes,tmp,logs}/<instance_subdir>`
    pub fn new(workflow_dir: &Path, instance_subdir: &Path) -> Self {
        Self {
            db: workflow_dir.join("db").join(instance_subdir),
            nodes: workflow_dir.join("nodes").join(instance_subdir),
            temps: workflow_dir.join("tmp").join(instance_subdir),
            logs: workflow_dir.join("logs").join(instance_subdir),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.db, &self.nodes, &self.temps, &self.logs]
    }
}

/// Node and resource state of one workflow instance
pub struct WorkflowDatabase {
    instance_subdir: PathBuf,
    dirs: InstanceDirs,
    pub node_manager: NodeManager,
    pub resource_manager: ResourceManager,
}

impl WorkflowDatabase {
    pub(crate) fn new(
        instance_subdir: PathBuf,
        dirs: InstanceDirs,
        node_manager: NodeManager,
        resource_manager: ResourceManager,
    ) -> Self {
        Self {
            instance_subdir,
            dirs,
            node_manager,
            resource_manager,
        }
    }

    pub fn instance_subdir(&self) -> &Path {
        &self.instance_subdir
    }

    pub fn dirs(&self) -> &InstanceDirs {
        &self.dirs
    }

    /// Directory for job logs of this instance
    pub fn logs_dir(&self) -> &Path {
        &self.dirs.logs
    }

    /// Flush durable state
    pub fn close(&mut self) -> PipedbResult<()> {
        self.resource_manager.close()
    }
}
