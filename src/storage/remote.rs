//! Local file bound to a remote object

use super::{remote_name, ObjectStorage};
use crate::error::{PipedbError, PipedbResult};
use crate::fsutil;
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

/// A resource file mirrored to an [`ObjectStorage`]
///
/// The remote creation time is fetched at most once and then kept in step
/// with this handle's own push, touch and delete calls.
pub struct RemoteFile<'s, S: ObjectStorage + ?Sized> {
    storage: &'s S,
    filename: PathBuf,
    name: String,
    createtime: Cell<Option<Option<f64>>>,
}

impl<'s, S: ObjectStorage + ?Sized> RemoteFile<'s, S> {
    /// Bind `filename` to the object named after its path
    pub fn new(storage: &'s S, filename: impl Into<PathBuf>) -> Self {
        let filename = filename.into();
        let name = remote_name(&filename);
        Self {
            storage,
            filename,
            name,
            createtime: Cell::new(None),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn remote_name(&self) -> &str {
        &self.name
    }

    /// Make sure the local file's directory exists
    pub fn allocate(&self) -> PipedbResult<()> {
        match self.filename.parent() {
            Some(parent) => fsutil::makedirs(parent),
            None => Ok(()),
        }
    }

    /// Upload the local file, stamping it with the file's modification time
    pub fn push(&self) -> PipedbResult<()> {
        let modified = fs::metadata(&self.filename)
            .and_then(|metadata| metadata.modified())
            .map_err(|e| PipedbError::io(format!("reading {}", self.filename.display()), e))?;
        let createtime = DateTime::<Utc>::from(modified);
        self.storage.push(&self.name, &self.filename, createtime)?;
        self.remember(Some(createtime));
        Ok(())
    }

    /// Download the remote object into the local file
    pub fn pull(&self) -> PipedbResult<()> {
        self.storage.pull(&self.name, &self.filename)
    }

    pub fn exists(&self) -> PipedbResult<bool> {
        Ok(self.createtime()?.is_some())
    }

    /// Remote creation time in seconds since the epoch
    pub fn createtime(&self) -> PipedbResult<Option<f64>> {
        if let Some(cached) = self.createtime.get() {
            return Ok(cached);
        }
        let createtime = self.storage.createtime(&self.name)?;
        Ok(self.remember(createtime))
    }

    pub fn touch(&self) -> PipedbResult<()> {
        let createtime = self.storage.touch(&self.name)?;
        self.remember(Some(createtime));
        Ok(())
    }

    pub fn delete(&self) -> PipedbResult<()> {
        self.storage.delete(&self.name)?;
        self.remember(None);
        Ok(())
    }

    // Stored at whole-second resolution, matching the metadata format
    fn remember(&self, createtime: Option<DateTime<Utc>>) -> Option<f64> {
        let seconds = createtime.map(|time| time.timestamp() as f64);
        self.createtime.set(Some(seconds));
        seconds
    }
}
