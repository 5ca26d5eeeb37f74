//! Directory-based run locks
//!
//! Creating a directory is atomic on every platform we care about and fails
//! if the directory already exists, which makes it a usable cross-process
//! mutual-exclusion primitive without any lock daemon. A lock left behind by
//! a crashed run has to be removed by an operator.

use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the sentinel directory inside a lock directory
pub const LOCK_SENTINEL: &str = "_lock";

/// Name of the owner record written inside the sentinel
const OWNER_FILE: &str = "owner.json";

/// Exclusive-run marker
pub trait AdvisoryLock: Sized {
    /// Take the lock at `path`, failing with `LockConflict` if it is held
    fn acquire(path: &Path) -> PipedbResult<Self>;

    /// Give the lock up
    fn release(self) -> PipedbResult<()>;

    /// Location of the lock
    fn path(&self) -> &Path;
}

/// Who holds a lock, for operators investigating a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOwner {
    /// Identifier of the run holding the lock
    pub run_id: Uuid,
    /// Process id of the run
    pub pid: u32,
    /// When the lock was taken
    pub acquired_at: DateTime<Utc>,
}

impl LockOwner {
    fn current() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pid: std::process::id(),
            acquired_at: Utc::now(),
        }
    }
}

/// Observed state of a lock path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    /// Held; the owner is `None` if its record is missing or unreadable
    Locked(Option<LockOwner>),
}

/// Lock held by the existence of a sentinel directory
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
    owner: LockOwner,
}

impl DirLock {
    pub fn owner(&self) -> &LockOwner {
        &self.owner
    }

    /// Inspect the lock at `path` without touching it
    pub fn status(path: &Path) -> PipedbResult<LockState> {
        if !path.is_dir() {
            return Ok(LockState::Unlocked);
        }
        let owner = fs::read(path.join(OWNER_FILE))
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok());
        Ok(LockState::Locked(owner))
    }

    /// Remove a lock regardless of who holds it
    ///
    /// Returns whether a lock was present.
    pub fn force_remove(path: &Path) -> PipedbResult<bool> {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                info!("Removed lock {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PipedbError::io(format!("removing lock {}", path.display()), e)),
        }
    }
}

/// Remove a lock directory whose owner record could not be written
///
/// The acquire error is what the caller sees, so a failure here is only logged.
fn discard_partial(path: &Path) {
    if let Err(e) = DirLock::force_remove(path) {
        warn!("Failed to remove partial lock {}: {}", path.display(), e);
    }
}

impl AdvisoryLock for DirLock {
    fn acquire(path: &Path) -> PipedbResult<Self> {
        if let Some(parent) = path.parent() {
            fsutil::makedirs(parent)?;
        }

        match fs::create_dir(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(PipedbError::LockConflict {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(PipedbError::io(
                    format!("creating lock {}", path.display()),
                    e,
                ))
            }
        }

        let owner = LockOwner::current();
        let record = serde_json::to_vec_pretty(&owner)?;
        if let Err(e) = fs::write(path.join(OWNER_FILE), record) {
            discard_partial(path);
            return Err(PipedbError::io(
                format!("writing lock owner in {}", path.display()),
                e,
            ));
        }

        info!("Acquired lock {} (run {})", path.display(), owner.run_id);
        Ok(Self {
            path: path.to_path_buf(),
            owner,
        })
    }

    fn release(self) -> PipedbResult<()> {
        fs::remove_dir_all(&self.path).map_err(|e| {
            PipedbError::io(format!("releasing lock {}", self.path.display()), e)
        })?;
        debug!("Released lock {}", self.path.display());
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
