use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

/// Temp file that is removed when dropped, on every exit path.
///
/// Removal failures are logged and swallowed: a stale scratch file must never
/// turn a finished analysis into an error.
#[derive(Debug)]
pub struct ScopedFile {
    path: Option<TempPath>,
}

impl ScopedFile {
    /// Reserves an empty file in `dir` whose name ends with `suffix`.
    pub fn create_in(dir: &Path, suffix: &str) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let file = Builder::new()
            .prefix("call-")
            .suffix(suffix)
            .tempfile_in(dir)?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    /// Saves `bytes` into a new scoped file.
    pub fn with_bytes(dir: &Path, suffix: &str, bytes: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut file = Builder::new()
            .prefix("call-")
            .suffix(suffix)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => &**path,
            None => Path::new(""),
        }
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => debug!(path = %shown, "released scratch file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %shown, error = %err, "failed to remove scratch file"),
        }
    }
}
