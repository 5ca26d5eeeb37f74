//! Object storage backends for resource files
//!
//! A resource file can be mirrored to an object store under a remote name
//! derived from its local path. The first path component names the container
//! and the rest names the object inside it. Creation times travel with the
//! object as metadata so staleness checks work without the local copy.

pub mod directory;
pub mod remote;

pub use directory::DirectoryObjectStorage;
pub use remote::RemoteFile;

use crate::error::{PipedbError, PipedbResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

/// Wire format of creation times stored as object metadata (UTC)
pub const CREATETIME_FORMAT: &str = "%Y/%m/%d-%H:%M:%S";

/// Pluggable push/pull store for resource files
pub trait ObjectStorage {
    /// Upload `file` as `name`, recording `createtime` with it
    fn push(&self, name: &str, file: &Path, createtime: DateTime<Utc>) -> PipedbResult<()>;

    /// Download `name` into `file`
    ///
    /// Fails with `InputMissing` if the object does not exist and with
    /// `CorruptInput` if the downloaded copy does not match what was pushed.
    fn pull(&self, name: &str, file: &Path) -> PipedbResult<()>;

    /// Recorded creation time of `name`, `None` if it does not exist
    fn createtime(&self, name: &str) -> PipedbResult<Option<DateTime<Utc>>>;

    /// Set the creation time of `name` to now and return it
    fn touch(&self, name: &str) -> PipedbResult<DateTime<Utc>>;

    /// Remove `name`; removing a missing object is not an error
    fn delete(&self, name: &str) -> PipedbResult<()>;
}

/// Remote name of a local path
pub fn remote_name(path: &Path) -> String {
    path.to_string_lossy().trim_matches('/').to_string()
}

/// Split a remote name into `(container, object)`
pub fn unpack_path(name: &str) -> PipedbResult<(&str, &str)> {
    let name = name.strip_prefix('/').unwrap_or(name);
    match name.split_once('/') {
        Some((container, object)) if !container.is_empty() && !object.is_empty() => {
            Ok((container, object))
        }
        _ => Err(PipedbError::InvalidRemoteName(name.to_string())),
    }
}

pub(crate) fn format_createtime(time: &DateTime<Utc>) -> String {
    time.format(CREATETIME_FORMAT).to_string()
}

pub(crate) fn parse_createtime(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, CREATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn remote_names_drop_surrounding_slashes() {
        assert_eq!(remote_name(Path::new("/bucket/tmp/a.bam/")), "bucket/tmp/a.bam");
        assert_eq!(remote_name(Path::new("bucket/a")), "bucket/a");
    }

    #[test]
    fn unpack_splits_container() {
        assert_eq!(unpack_path("bucket/tmp/a.bam").unwrap(), ("bucket", "tmp/a.bam"));
        assert_eq!(unpack_path("/bucket/a").unwrap(), ("bucket", "a"));
        assert!(matches!(
            unpack_path("bucket"),
            Err(PipedbError::InvalidRemoteName(_))
        ));
        assert!(unpack_path("bucket/").is_err());
    }

    #[test]
    fn createtime_text_format() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_createtime(&time), "2024/03/09-07:05:01");
        assert_eq!(parse_createtime("2024/03/09-07:05:01"), Some(time));
        assert_eq!(parse_createtime("yesterday"), None);
    }
}
