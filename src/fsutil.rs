//! Small filesystem helpers shared by the stores

use crate::error::{PipedbError, PipedbResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Create a directory and all parents, naming the path on failure
pub fn makedirs(path: &Path) -> PipedbResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| PipedbError::io(format!("creating directory {}", path.display()), e))
}

/// Modification time of `path` in fractional seconds since the Unix epoch
///
/// Returns `None` when the file does not exist.
pub fn modified_time(path: &Path) -> PipedbResult<Option<f64>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(PipedbError::io(
                format!("reading metadata of {}", path.display()),
                e,
            ))
        }
    };
    let modified = metadata
        .modified()
        .map_err(|e| PipedbError::io(format!("reading mtime of {}", path.display()), e))?;
    let seconds = match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    };
    Ok(Some(seconds))
}

/// Sibling path used for write-then-replace
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `target` with `temp` unless both hold identical bytes
///
/// When the contents match, `temp` is removed and `target` keeps its
/// modification time. Returns whether `target` was replaced.
pub fn overwrite_if_different(temp: &Path, target: &Path) -> PipedbResult<bool> {
    let new_contents = fs::read(temp)
        .map_err(|e| PipedbError::io(format!("reading {}", temp.display()), e))?;

    let unchanged = match fs::read(target) {
        Ok(old_contents) => old_contents == new_contents,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => return Err(PipedbError::io(format!("reading {}", target.display()), e)),
    };

    if unchanged {
        fs::remove_file(temp)
            .map_err(|e| PipedbError::io(format!("removing {}", temp.display()), e))?;
        return Ok(false);
    }

    fs::rename(temp, target).map_err(|e| {
        PipedbError::io(
            format!("moving {} into place at {}", temp.display(), target.display()),
            e,
        )
    })?;
    Ok(true)
}

/// Write `contents` to `target` through a temporary sibling, replacing only
/// on change
pub fn write_if_different(target: &Path, contents: &[u8]) -> PipedbResult<bool> {
    if let Some(parent) = target.parent() {
        makedirs(parent)?;
    }
    let temp = temp_path(target);
    {
        let mut file = fs::File::create(&temp)
            .map_err(|e| PipedbError::io(format!("creating {}", temp.display()), e))?;
        file.write_all(contents)
            .map_err(|e| PipedbError::io(format!("writing {}", temp.display()), e))?;
        file.sync_all()
            .map_err(|e| PipedbError::io(format!("flushing {}", temp.display()), e))?;
    }
    overwrite_if_different(&temp, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn modified_time_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(modified_time(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn modified_time_of_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, b"x").unwrap();
        assert!(modified_time(&path).unwrap().unwrap() > 0.0);
    }

    #[test]
    fn temp_path_is_sibling() {
        assert_eq!(
            temp_path(Path::new("/a/b/sample.chunks")),
            PathBuf::from("/a/b/sample.chunks.tmp")
        );
    }

    #[test]
    fn identical_write_is_skipped() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("sub").join("data");

        assert!(write_if_different(&target, b"hello").unwrap());
        let first = modified_time(&target).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!write_if_different(&target, b"hello").unwrap());
        assert_eq!(modified_time(&target).unwrap(), first);
        assert!(!temp_path(&target).exists());

        assert!(write_if_different(&target, b"changed").unwrap());
        assert_eq!(fs::read(&target).unwrap(), b"changed");
    }
}
