//! Error type returned by every filesystem operation.

use std::fmt;
use std::io;

/// Everything that can go wrong while mounting a device or operating on a
/// mounted filesystem.
#[derive(Debug)]
pub enum FsError {
	/// An operation that requires a mounted device was attempted without one.
	NotMounted,
	/// `mount` was called while a device was already mounted.
	AlreadyMounted,
	/// A block device read or write failed.
	Io(io::Error),
	/// The on-disk layout does not satisfy the superblock/FAT invariants.
	CorruptMetadata(&'static str),
	/// A file name is empty, absent, or longer than 15 bytes.
	InvalidName,
	/// `create` was called with a name that already has an entry.
	Exists,
	/// No directory entry matches the given name.
	NotFound,
	/// The root directory has no free entry left.
	NoSlot,
	/// The FAT has no free data block left.
	NoSpace,
	/// The open-file table is at capacity.
	TooManyOpen,
	/// The given descriptor is out of range or not open.
	BadFd,
	/// `lseek` was given an offset past the end of the file.
	InvalidOffset,
	/// `umount` was refused because descriptors are still open.
	Busy,
}

impl fmt::Display for FsError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotMounted => write!(f, "no filesystem is mounted"),
			Self::AlreadyMounted => write!(f, "a filesystem is already mounted"),
			Self::Io(e) => write!(f, "I/O error: {}", e),
			Self::CorruptMetadata(why) => write!(f, "corrupt metadata: {}", why),
			Self::InvalidName => write!(f, "invalid file name"),
			Self::Exists => write!(f, "file already exists"),
			Self::NotFound => write!(f, "no such file"),
			Self::NoSlot => write!(f, "root directory is full"),
			Self::NoSpace => write!(f, "no space left on device"),
			Self::TooManyOpen => write!(f, "too many open files"),
			Self::BadFd => write!(f, "bad file descriptor"),
			Self::InvalidOffset => write!(f, "offset past end of file"),
			Self::Busy => write!(f, "filesystem busy: descriptors still open"),
		}
	}
}

impl std::error::Error for FsError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for FsError {
	fn from(e: io::Error) -> Self {
		Self::Io(e)
	}
}

/// Shorthand for `Result<T, FsError>`.
pub type Result<T> = std::result::Result<T, FsError>;
