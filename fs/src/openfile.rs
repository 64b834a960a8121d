//! The in-memory open-file table: per-descriptor cursor state.

use crate::error::FsError;
use crate::error::Result;

/// Number of simultaneously open descriptors.
pub const MAX_FD: usize = 32;

/// Cursor state for one open descriptor.
#[derive(Debug, Clone, Copy)]
pub struct OpenFile {
	/// Index of the directory slot this descriptor refers to.
	pub dir_index: usize,
	/// Cached copy of the file's size.
	pub size: u32,
	/// Byte offset cursor, `0 <= offset <= size`.
	pub offset: u32,
	/// Chain head block index, `EOC` for an empty file.
	pub head: u16,
}

/// Fixed-capacity table of open descriptors.
pub struct OpenFileTable {
	slots: [Option<OpenFile>; MAX_FD],
}

impl OpenFileTable {
	/// An empty table, as prepared at mount time.
	pub fn new() -> Self {
		Self {
			slots: [None; MAX_FD],
		}
	}

	/// Allocates the first free descriptor for a file already looked up in
	/// the directory.
	pub fn open(&mut self, dir_index: usize, size: u32, head: u16) -> Result<usize> {
		let fd = self
			.slots
			.iter()
			.position(|s| s.is_none())
			.ok_or(FsError::TooManyOpen)?;
		self.slots[fd] = Some(OpenFile {
			dir_index,
			size,
			offset: 0,
			head,
		});
		Ok(fd)
	}

	/// Closes `fd`, freeing its slot.
	pub fn close(&mut self, fd: usize) -> Result<()> {
		self.get(fd)?;
		self.slots[fd] = None;
		Ok(())
	}

	/// Read-only access to descriptor `fd`.
	pub fn get(&self, fd: usize) -> Result<&OpenFile> {
		self.slots.get(fd).and_then(|s| s.as_ref()).ok_or(FsError::BadFd)
	}

	/// Mutable access to descriptor `fd`.
	pub fn get_mut(&mut self, fd: usize) -> Result<&mut OpenFile> {
		self.slots.get_mut(fd).and_then(|s| s.as_mut()).ok_or(FsError::BadFd)
	}

	/// Cached file size for `fd`.
	pub fn stat(&self, fd: usize) -> Result<u32> {
		Ok(self.get(fd)?.size)
	}

	/// Moves `fd`'s cursor to `offset`, which must not exceed the cached
	/// size.
	pub fn lseek(&mut self, fd: usize, offset: u32) -> Result<()> {
		let of = self.get_mut(fd)?;
		if offset > of.size {
			return Err(FsError::InvalidOffset);
		}
		of.offset = offset;
		Ok(())
	}

	/// Whether any descriptor is still open, used to refuse `umount`.
	pub fn any_open(&self) -> bool {
		self.slots.iter().any(|s| s.is_some())
	}

	/// Descriptors currently pointing at directory slot `dir_index`, used to
	/// refuse `delete` on a file with open descriptors.
	pub fn is_open_at(&self, dir_index: usize) -> bool {
		self.slots.iter().flatten().any(|s| s.dir_index == dir_index)
	}
}

impl Default for OpenFileTable {
	fn default() -> Self {
		Self::new()
	}
}
