//! Output files.
//!
//! [`NumberedFileWriter`] stores each encoded image as `000.png`, `001.png`,
//! … in one directory. Existing files with the same name are overwritten, so
//! running the extraction twice into the same directory replaces the earlier
//! output.

use std::{
    fs::{DirBuilder, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::ExtractError;

/// Extension of every file written by [`NumberedFileWriter`].
pub const IMAGE_EXTENSION: &str = "png";

/// Persists encoded payloads.
pub trait FrameWriter {
    /// Store `payload` as the image with the given frame index and return
    /// the path written.
    fn write(&mut self, payload: &[u8], index: usize) -> Result<PathBuf, ExtractError>;
}

/// Writes `<dir>/<index:03>.png` files.
#[derive(Debug, Clone)]
pub struct NumberedFileWriter {
    directory: PathBuf,
}

impl NumberedFileWriter {
    /// Create the output directory if it does not exist yet.
    ///
    /// On Unix the directory is created with mode `0755`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::OutputDirectory`] if the directory cannot be
    /// created.
    pub fn create<P: AsRef<Path>>(directory: P) -> Result<Self, ExtractError> {
        let directory = directory.as_ref().to_path_buf();

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(&directory)
            .map_err(|source| ExtractError::OutputDirectory {
                path: directory.clone(),
                source,
            })?;

        log::debug!("Writing frames to {}", directory.display());
        Ok(Self { directory })
    }

    /// Directory the files are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file for frame `index`.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.directory.join(file_name(index))
    }
}

impl FrameWriter for NumberedFileWriter {
    fn write(&mut self, payload: &[u8], index: usize) -> Result<PathBuf, ExtractError> {
        let path = self.path_for(index);
        let wrap = |source: std::io::Error| ExtractError::Write {
            path: path.clone(),
            source,
        };

        let mut file = File::create(&path).map_err(wrap)?;
        file.write_all(payload).map_err(wrap)?;
        file.sync_all().map_err(wrap)?;

        log::info!("{} bytes written to {}", payload.len(), path.display());
        Ok(path)
    }
}

/// Zero-padded file name for frame `index`: `7` → `007.png`.
pub fn file_name(index: usize) -> String {
    format!("{index:03}.{IMAGE_EXTENSION}")
}
