use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "debug-log")]
use tracing::instrument;

/// Exclusive advisory lock guarding writes to one generated file.
///
/// The lock file itself is left in place on drop: unlinking it would let a
/// process still waiting on the old inode proceed alongside a newcomer.
#[derive(Debug)]
pub struct OutputLock {
    file: File,
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        // Best-effort unlock; closing the file releases it anyway
        let _ = self.file.unlock();
    }
}

/// `<target>.lock`, next to the file it guards.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "luna".into());
    name.push(".lock");
    target.with_file_name(name)
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
}

#[cfg_attr(
    feature = "debug-log",
    instrument(level = "debug", err, fields(lock = %path.display()))
)]
/// Block until the exclusive lock on `path` is held.
pub fn acquire_output_lock(path: &Path) -> io::Result<OutputLock> {
    let file = open_lock_file(path)?;
    file.lock_exclusive()?;
    Ok(OutputLock { file })
}
