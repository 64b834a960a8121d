//! Fixed-size block I/O over an image file.

use crate::error::{FsError, Result};
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Read;
use std::io::Write;
use std::path::Path;

/// The size of a block, in bytes.
pub const BLOCK_SIZE: usize = 4096;

/// Adapter performing fixed `BLOCK_SIZE`-byte reads and writes over an image
/// file opened for the lifetime of a mount.
pub struct BlockDevice {
	file: File,
	block_count: u16,
}

impl BlockDevice {
	/// Opens the image at `path` and computes its block count.
	///
	/// The file's byte length must be a multiple of `BLOCK_SIZE`.
	pub fn open(path: &Path) -> Result<Self> {
		let file = OpenOptions::new().read(true).write(true).open(path)?;
		let len = file.metadata()?.len();

		if len % BLOCK_SIZE as u64 != 0 {
			return Err(FsError::CorruptMetadata("image size is not a multiple of the block size"));
		}
		let block_count = len / BLOCK_SIZE as u64;
		if block_count > u16::MAX as u64 {
			return Err(FsError::CorruptMetadata("image has more blocks than a u16 can address"));
		}

		Ok(Self {
			file,
			block_count: block_count as u16,
		})
	}

	/// The number of `BLOCK_SIZE`-byte blocks in the image.
	pub fn block_count(&self) -> u16 {
		self.block_count
	}

	/// Reads block `index` into `buf`.
	pub fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
		self.check_index(index)?;
		self.file.seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
		self.file.read_exact(buf)?;
		Ok(())
	}

	/// Writes `buf` to block `index`.
	pub fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
		self.check_index(index)?;
		self.file.seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
		self.file.write_all(buf)?;
		Ok(())
	}

	fn check_index(&self, index: u16) -> Result<()> {
		if index >= self.block_count {
			return Err(FsError::Io(std::io::Error::new(
				std::io::ErrorKind::InvalidInput,
				"block index out of range",
			)));
		}
		Ok(())
	}
}
