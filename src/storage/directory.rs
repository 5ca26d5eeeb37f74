//! Object storage rooted in a local directory

use super::{format_createtime, parse_createtime, unpack_path, ObjectStorage};
use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata kept next to each object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ObjectMeta {
    create_time: String,
    size: u64,
    sha256: String,
}

/// Objects stored as `<root>/<container>/<object>` with a
/// `<object>.meta.json` sidecar
#[derive(Debug, Clone)]
pub struct DirectoryObjectStorage {
    root: PathBuf,
}

impl DirectoryObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> PipedbResult<PathBuf> {
        let (container, object) = unpack_path(name)?;
        Ok(self.root.join(container).join(object))
    }

    fn meta_path(object_path: &Path) -> PathBuf {
        let mut file_name = object_path.file_name().unwrap_or_default().to_os_string();
        file_name.push(".meta.json");
        object_path.with_file_name(file_name)
    }

    fn read_meta(object_path: &Path) -> PipedbResult<Option<ObjectMeta>> {
        let path = Self::meta_path(object_path);
        match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| PipedbError::Decode { path, source }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipedbError::io(format!("reading {}", path.display()), e)),
        }
    }

    fn write_meta(object_path: &Path, meta: &ObjectMeta) -> PipedbResult<()> {
        let content = serde_json::to_vec_pretty(meta)?;
        fsutil::write_if_different(&Self::meta_path(object_path), &content)?;
        Ok(())
    }
}

fn sha256_file(path: &Path) -> PipedbResult<String> {
    let mut file =
        File::open(path).map_err(|e| PipedbError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| PipedbError::io(format!("hashing {}", path.display()), e))?;
    Ok(hex::encode(hasher.finalize()))
}

fn remove_if_exists(path: &Path) -> PipedbResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipedbError::io(format!("removing {}", path.display()), e)),
    }
}

impl ObjectStorage for DirectoryObjectStorage {
    fn push(&self, name: &str, file: &Path, createtime: DateTime<Utc>) -> PipedbResult<()> {
        let object_path = self.object_path(name)?;
        if let Some(parent) = object_path.parent() {
            fsutil::makedirs(parent)?;
        }

        let size = fs::copy(file, &object_path).map_err(|e| {
            PipedbError::io(
                format!("copying {} to {}", file.display(), object_path.display()),
                e,
            )
        })?;
        let meta = ObjectMeta {
            create_time: format_createtime(&createtime),
            size,
            sha256: sha256_file(&object_path)?,
        };
        Self::write_meta(&object_path, &meta)?;

        debug!("Pushed {} as {} ({} bytes)", file.display(), name, size);
        Ok(())
    }

    fn pull(&self, name: &str, file: &Path) -> PipedbResult<()> {
        let object_path = self.object_path(name)?;
        if !object_path.is_file() {
            return Err(PipedbError::InputMissing(name.to_string()));
        }
        let meta = Self::read_meta(&object_path)?.ok_or_else(|| PipedbError::CorruptInput {
            name: name.to_string(),
            reason: "metadata is missing".to_string(),
        })?;

        if let Some(parent) = file.parent() {
            fsutil::makedirs(parent)?;
        }
        let size = fs::copy(&object_path, file).map_err(|e| {
            PipedbError::io(
                format!("copying {} to {}", object_path.display(), file.display()),
                e,
            )
        })?;

        if size != meta.size {
            return Err(PipedbError::CorruptInput {
                name: name.to_string(),
                reason: format!(
                    "expected {} bytes, {} has {}",
                    meta.size,
                    file.display(),
                    size
                ),
            });
        }
        let digest = sha256_file(file)?;
        if digest != meta.sha256 {
            return Err(PipedbError::CorruptInput {
                name: name.to_string(),
                reason: format!("sha256 {} does not match recorded {}", digest, meta.sha256),
            });
        }

        debug!("Pulled {} into {}", name, file.display());
        Ok(())
    }

    fn createtime(&self, name: &str) -> PipedbResult<Option<DateTime<Utc>>> {
        let object_path = self.object_path(name)?;
        if !object_path.is_file() {
            return Ok(None);
        }
        Ok(Self::read_meta(&object_path)?.and_then(|meta| parse_createtime(&meta.create_time)))
    }

    fn touch(&self, name: &str) -> PipedbResult<DateTime<Utc>> {
        let object_path = self.object_path(name)?;
        let mut meta = match Self::read_meta(&object_path)? {
            Some(meta) if object_path.is_file() => meta,
            _ => return Err(PipedbError::InputMissing(name.to_string())),
        };
        let now = Utc::now();
        meta.create_time = format_createtime(&now);
        Self::write_meta(&object_path, &meta)?;
        Ok(now)
    }

    fn delete(&self, name: &str) -> PipedbResult<()> {
        let object_path = self.object_path(name)?;
        remove_if_exists(&object_path)?;
        remove_if_exists(&Self::meta_path(&object_path))?;
        debug!("Deleted {}", name);
        Ok(())
    }
}
