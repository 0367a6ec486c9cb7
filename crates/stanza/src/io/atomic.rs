//! # Whole-File Writes

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::errors::StanzaResult;

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_and_rename<F>(
    tmp: &Path,
    path: &Path,
    write: F,
) -> StanzaResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> StanzaResult<()>,
{
    let mut writer = BufWriter::new(File::create(tmp)?);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);
    fs::rename(tmp, path)?;
    Ok(())
}

/// Write a file by writing a sibling ``*.tmp`` file and renaming it over `path`.
///
/// Readers never observe a half-written `path`. On error the temp file is
/// removed on a best-effort basis.
///
/// ## Arguments
/// * `path` - the final path.
/// * `write` - writes the full contents.
pub fn write_file_atomic<P, F>(
    path: P,
    write: F,
) -> StanzaResult<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> StanzaResult<()>,
{
    let path = path.as_ref();
    let tmp = temp_path(path);

    let result = write_and_rename(&tmp, path, write);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StanzaError;

    #[test]
    fn test_write_file_atomic() {
        let dir = tempdir::TempDir::new("atomic_test").unwrap();
        let path = dir.path().join("out.txt");

        write_file_atomic(&path, |w| {
            w.write_all(b"hello")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_failed_write_keeps_original() {
        let dir = tempdir::TempDir::new("atomic_test").unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, b"original").unwrap();

        let result = write_file_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(StanzaError::External("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!temp_path(&path).exists());
    }
}
