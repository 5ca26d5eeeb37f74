//! Lock-bracketed creation of workflow databases

use super::database::{InstanceDirs, WorkflowDatabase};
use super::lock::{AdvisoryLock, DirLock, LockState, LOCK_SENTINEL};
use crate::error::PipedbResult;
use crate::fsutil;
use crate::nodes::NodeManager;
use crate::resources::manager::DEFAULT_TEMPS_SUFFIX;
use crate::resources::ResourceManager;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Creates workflow databases and holds their run locks until teardown
pub struct WorkflowDatabaseFactory<L: AdvisoryLock = DirLock> {
    workflow_dir: PathBuf,
    temps_suffix: String,
    locks: Vec<L>,
}

/// Path of the run lock for an instance
pub fn lock_path(workflow_dir: &Path, instance_subdir: &Path) -> PathBuf {
    workflow_dir
        .join("locks")
        .join(instance_subdir)
        .join(LOCK_SENTINEL)
}

/// Report whether an instance is locked, and by whom
pub fn lock_status(workflow_dir: &Path, instance_subdir: &Path) -> PipedbResult<LockState> {
    DirLock::status(&lock_path(workflow_dir, instance_subdir))
}

/// Remove a stale run lock. Returns whether one was present.
pub fn force_unlock(workflow_dir: &Path, instance_subdir: &Path) -> PipedbResult<bool> {
    DirLock::force_remove(&lock_path(workflow_dir, instance_subdir))
}

impl<L: AdvisoryLock> WorkflowDatabaseFactory<L> {
    pub fn new(workflow_dir: impl Into<PathBuf>) -> Self {
        Self {
            workflow_dir: workflow_dir.into(),
            temps_suffix: DEFAULT_TEMPS_SUFFIX.to_string(),
            locks: Vec::new(),
        }
    }

    pub fn with_temps_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temps_suffix = suffix.into();
        self
    }

    pub fn workflow_dir(&self) -> &Path {
        &self.workflow_dir
    }

    /// Number of locks currently held
    pub fn held_locks(&self) -> usize {
        self.locks.len()
    }

    /// Lock an instance and open its database
    ///
    /// Fails with `LockConflict` if another run holds the instance. The lock
    /// stays held until [`teardown`](Self::teardown) or drop.
    pub fn create(&mut self, instance_subdir: impl AsRef<Path>) -> PipedbResult<WorkflowDatabase> {
        let instance_subdir = instance_subdir.as_ref();
        let lock = L::acquire(&lock_path(&self.workflow_dir, instance_subdir))?;
        self.locks.push(lock);

        let dirs = InstanceDirs::new(&self.workflow_dir, instance_subdir);
        for dir in dirs.all() {
            fsutil::makedirs(dir)?;
        }

        let node_manager = NodeManager::new(&dirs.nodes, &dirs.temps);
        let resource_manager = ResourceManager::open(&dirs.temps, &dirs.db)?
            .with_temps_suffix(self.temps_suffix.clone());

        debug!(
            "Opened workflow database for instance {:?}",
            instance_subdir.display().to_string()
        );
        Ok(WorkflowDatabase::new(
            instance_subdir.to_path_buf(),
            dirs,
            node_manager,
            resource_manager,
        ))
    }

    /// Open the database of a sub-workflow nested under `parent`
    pub fn create_nested(
        &mut self,
        parent: &WorkflowDatabase,
        name: &str,
    ) -> PipedbResult<WorkflowDatabase> {
        let subdir = parent.instance_subdir().join(name);
        self.create(subdir)
    }

    /// Release every held lock, most recent first
    ///
    /// Release failures are logged and otherwise ignored.
    pub fn teardown(&mut self) {
        while let Some(lock) = self.locks.pop() {
            let path = lock.path().to_path_buf();
            if let Err(e) = lock.release() {
                warn!("Failed to release lock {}: {}", path.display(), e);
            }
        }
    }
}

impl<L: AdvisoryLock> Drop for WorkflowDatabaseFactory<L> {
    fn drop(&mut self) {
        self.teardown();
    }
}
