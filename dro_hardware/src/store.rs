//! File-backed stand-in for the board's byte-addressed NVM.
//!
//! The whole image is held in memory; every write rewrites the file
//! atomically. Values are little-endian `i32`s at caller-chosen offsets.

use std::path::{Path, PathBuf};

use dro_traits::{BoxError, CalibrationStore};

use crate::error::{HwError, Result};
use crate::util::write_atomic;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    image: Vec<u8>,
}

impl FileStore {
    /// Open `path`, or start from an all-zero image of `size` bytes if it does
    /// not exist yet. The file is only created on the first write.
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let image = match std::fs::read(&path) {
            Ok(bytes) if bytes.len() == size => bytes,
            Ok(bytes) => {
                return Err(HwError::ImageSize {
                    expected: size,
                    got: bytes.len(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), size, "nvm image not found; starting erased");
                vec![0; size]
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, image })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    fn span(&self, offset: u16) -> Result<std::ops::Range<usize>> {
        let start = usize::from(offset);
        let end = start + 4;
        if end > self.image.len() {
            return Err(HwError::OutOfRange {
                offset,
                len: self.image.len(),
            });
        }
        Ok(start..end)
    }

    pub fn read_i32(&self, offset: u16) -> Result<i32> {
        let span = self.span(offset)?;
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.image[span]);
        Ok(i32::from_le_bytes(b))
    }

    pub fn write_i32(&mut self, offset: u16, value: i32) -> Result<()> {
        let span = self.span(offset)?;
        let mut next = self.image.clone();
        next[span].copy_from_slice(&value.to_le_bytes());
        // The in-memory image only changes once the file does.
        write_atomic(&self.path, &next)?;
        self.image = next;
        tracing::debug!(offset, value, path = %self.path.display(), "nvm write");
        Ok(())
    }
}

impl CalibrationStore for FileStore {
    fn read(&mut self, offset: u16) -> std::result::Result<Option<i32>, BoxError> {
        Ok(Some(self.read_i32(offset)?))
    }

    fn write(&mut self, offset: u16, value: i32) -> std::result::Result<(), BoxError> {
        Ok(self.write_i32(offset, value)?)
    }
}
