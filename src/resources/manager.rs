//! Resource lifecycle: paths, creation times, aliases and disposal

use crate::address::Node;
use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use crate::resources::id::{FilenameCreator, ResourceId};
use crate::store::{JsonFileStore, KeyValueStore};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default suffix marking pipeline-managed temporaries
pub const DEFAULT_TEMPS_SUFFIX: &str = ".tmp";

/// File name of the creation-time map inside an instance's db directory
pub const CREATETIMES_FILE: &str = "createtimes.json";

/// Outcome of a [`ResourceManager::cleanup`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Disposable files deleted
    pub removed: usize,
    /// Obsolete identities kept because an alias to them is still live
    pub retained: usize,
}

/// Maps resource identities to files and tracks their lifecycle
///
/// Creation times persist through the injected [`KeyValueStore`]; aliases and
/// the disposable registry live for the manager's lifetime only.
pub struct ResourceManager {
    temps_dir: PathBuf,
    temps_suffix: String,
    createtimes: Box<dyn KeyValueStore<f64>>,
    disposable: HashMap<ResourceId, BTreeSet<PathBuf>>,
    aliases: HashMap<ResourceId, ResourceId>,
    rev_alias: HashMap<ResourceId, Vec<ResourceId>>,
}

impl ResourceManager {
    pub fn new(temps_dir: impl Into<PathBuf>, createtimes: Box<dyn KeyValueStore<f64>>) -> Self {
        Self {
            temps_dir: temps_dir.into(),
            temps_suffix: DEFAULT_TEMPS_SUFFIX.to_string(),
            createtimes,
            disposable: HashMap::new(),
            aliases: HashMap::new(),
            rev_alias: HashMap::new(),
        }
    }

    /// Manager with creation times persisted in `db_dir`
    pub fn open(temps_dir: impl Into<PathBuf>, db_dir: &Path) -> PipedbResult<Self> {
        let store = JsonFileStore::<f64>::open(db_dir.join(CREATETIMES_FILE))?;
        Ok(Self::new(temps_dir, Box::new(store)))
    }

    /// Use a different suffix for temporaries
    pub fn with_temps_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temps_suffix = suffix.into();
        self
    }

    pub fn temps_dir(&self) -> &Path {
        &self.temps_dir
    }

    /// Filename derivation for pipeline temporaries
    pub fn filename_creator(&self) -> FilenameCreator {
        FilenameCreator::new(&self.temps_dir, &self.temps_suffix)
    }

    /// Path backing `name` at `node`, following aliases to their target
    ///
    /// `name` is joined as a relative path and must not be absolute.
    pub fn get_filename(&self, name: &str, node: &Node) -> PipedbResult<PathBuf> {
        debug_assert!(
            !Path::new(name).is_absolute(),
            "resource name {name:?} is absolute"
        );
        let mut current = ResourceId::new(name, node.clone());
        let mut seen = HashSet::new();
        while let Some(target) = self.aliases.get(&current) {
            if !seen.insert(current.clone()) {
                return Err(PipedbError::AliasCycle(
                    ResourceId::new(name, node.clone()).to_string(),
                ));
            }
            current = target.clone();
        }
        Ok(self
            .temps_dir
            .join(current.node.subdir())
            .join(&current.name))
    }

    /// Make `alias_name` at `alias_node` share the storage of `name` at `node`
    pub fn add_alias(&mut self, name: &str, node: &Node, alias_name: &str, alias_node: &Node) {
        let target = ResourceId::new(name, node.clone());
        let alias = ResourceId::new(alias_name, alias_node.clone());
        debug!("Aliasing {} to {}", alias, target);
        self.aliases.insert(alias.clone(), target.clone());
        self.rev_alias.entry(target).or_default().push(alias);
    }

    /// Every identity redirecting to `name` at `node`, directly or transitively
    pub fn get_aliases(&self, name: &str, node: &Node) -> Vec<ResourceId> {
        let id = ResourceId::new(name, node.clone());
        let mut seen = HashSet::from([id.clone()]);
        let mut found = Vec::new();
        self.collect_aliases(&id, &mut seen, &mut found);
        found
    }

    fn collect_aliases(
        &self,
        id: &ResourceId,
        seen: &mut HashSet<ResourceId>,
        found: &mut Vec<ResourceId>,
    ) {
        for alias in self.rev_alias.get(id).into_iter().flatten() {
            if seen.insert(alias.clone()) {
                found.push(alias.clone());
                self.collect_aliases(alias, seen, found);
            }
        }
    }

    /// Record the current modification time of `filename` for the identity
    pub fn store_createtime(&mut self, name: &str, node: &Node, filename: &Path) -> PipedbResult<()> {
        let Some(createtime) = fsutil::modified_time(filename)? else {
            return Err(PipedbError::io(
                format!("recording create time of {}", filename.display()),
                io::Error::new(ErrorKind::NotFound, "file does not exist"),
            ));
        };
        self.createtimes
            .set(&ResourceId::new(name, node.clone()).key(), createtime)
    }

    /// Last known creation time, refreshed from `filename` if it exists
    pub fn retrieve_createtime(
        &mut self,
        name: &str,
        node: &Node,
        filename: &Path,
    ) -> PipedbResult<Option<f64>> {
        let key = ResourceId::new(name, node.clone()).key();
        if let Some(createtime) = fsutil::modified_time(filename)? {
            self.createtimes.set(&key, createtime)?;
        }
        Ok(self.createtimes.get(&key))
    }

    /// Whether the identity is a pipeline-managed intermediate
    ///
    /// External inputs never get creation-time records.
    pub fn is_temp_file(&self, name: &str, node: &Node) -> bool {
        self.createtimes
            .contains(&ResourceId::new(name, node.clone()).key())
    }

    /// Mark `filename` for deletion once the identity becomes obsolete
    pub fn register_disposable(&mut self, name: &str, node: &Node, filename: impl Into<PathBuf>) {
        self.disposable
            .entry(ResourceId::new(name, node.clone()))
            .or_default()
            .insert(filename.into());
    }

    /// Delete disposable files of obsolete identities
    ///
    /// An identity's files go only once it and every alias redirecting to it
    /// are obsolete. Processed identities leave `obsolete`; identities that are
    /// themselves aliases stay in it untouched. Safe to call repeatedly as more
    /// of an alias closure turns obsolete.
    pub fn cleanup(&mut self, obsolete: &mut HashSet<ResourceId>) -> PipedbResult<CleanupSummary> {
        let mut summary = CleanupSummary::default();
        let mut pending: Vec<ResourceId> = obsolete.iter().cloned().collect();
        pending.sort();

        for id in pending {
            if self.aliases.contains_key(&id) {
                continue;
            }

            let closure_obsolete = self
                .get_aliases(&id.name, &id.node)
                .iter()
                .all(|alias| obsolete.contains(alias));

            if closure_obsolete {
                // paths leave the registry one at a time, so a failed removal
                // keeps it and everything after it for the next pass
                if let Some(filenames) = self.disposable.get_mut(&id) {
                    while let Some(filename) = filenames.first().cloned() {
                        if remove_if_exists(&filename)? {
                            summary.removed += 1;
                        }
                        filenames.remove(&filename);
                    }
                }
                self.disposable.remove(&id);
            } else {
                summary.retained += 1;
            }

            obsolete.remove(&id);
        }

        if summary.removed > 0 {
            info!("Removed {} obsolete temporary file(s)", summary.removed);
        }
        Ok(summary)
    }

    /// Flush creation times to durable storage
    pub fn close(&mut self) -> PipedbResult<()> {
        self.createtimes.close()
    }
}

fn remove_if_exists(path: &Path) -> PipedbResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PipedbError::io(format!("removing {}", path.display()), e)),
    }
}
