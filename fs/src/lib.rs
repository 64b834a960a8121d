//! A small, self-contained filesystem layered over a fixed-size block
//! device: a flat directory of named files stored as linked chains of data
//! blocks governed by an allocation table (FAT).
//!
//! [`FileSystem`] is the public facade: it owns the mount lifecycle and maps
//! the classic mount/create/open/read/write/close/unmount operations onto
//! the on-disk superblock, FAT, root directory and in-memory open-file
//! table.

pub mod device;
pub mod directory;
pub mod engine;
pub mod error;
pub mod fat;
pub mod format;
pub mod openfile;
pub mod superblock;

use device::BlockDevice;
use device::BLOCK_SIZE;
use directory::Directory;
use directory::MAX_FILES;
use error::FsError;
use error::Result;
use fat::Fat;
use fat::EOC;
use openfile::OpenFileTable;
use std::path::Path;
use superblock::Superblock;

struct Mounted {
	device: BlockDevice,
	superblock: Superblock,
	fat: Fat,
	directory: Directory,
	open_files: OpenFileTable,
}

/// Owns the mount lifecycle and in-memory state of one mounted image.
///
/// No operation may run concurrently with another: the filesystem is
/// single-threaded and strictly sequential by design, matching the
/// underlying image format's lack of any locking or journaling.
pub struct FileSystem {
	mounted: Option<Mounted>,
}

impl FileSystem {
	/// An unmounted filesystem handle.
	pub fn new() -> Self {
		Self { mounted: None }
	}

	fn state(&self) -> Result<&Mounted> {
		self.mounted.as_ref().ok_or(FsError::NotMounted)
	}

	fn state_mut(&mut self) -> Result<&mut Mounted> {
		self.mounted.as_mut().ok_or(FsError::NotMounted)
	}

	/// Opens `path`, validates the superblock, and loads the FAT and root
	/// directory into memory.
	pub fn mount(&mut self, path: &Path) -> Result<()> {
		if self.mounted.is_some() {
			return Err(FsError::AlreadyMounted);
		}

		let mut device = BlockDevice::open(path)?;
		let superblock = Superblock::load(&mut device)?;
		let fat = Fat::load(&mut device, &superblock)?;
		let directory = Directory::load(&mut device, &superblock)?;

		self.mounted = Some(Mounted {
			device,
			superblock,
			fat,
			directory,
			open_files: OpenFileTable::new(),
		});
		Ok(())
	}

	/// Flushes the FAT and root directory back to the device and releases
	/// the mount. Refused if descriptors are still open.
	pub fn umount(&mut self) -> Result<()> {
		let state = self.state()?;
		if state.open_files.any_open() {
			return Err(FsError::Busy);
		}

		let mut state = self.mounted.take().expect("checked above");
		state.fat.persist(&mut state.device, &state.superblock)?;
		state.directory.persist(&mut state.device, &state.superblock)?;
		Ok(())
	}

	/// Prints the layout and free-space ratios of the mounted image.
	pub fn info(&self) -> Result<()> {
		let state = self.state()?;
		let sb = &state.superblock;
		println!("FS Info:");
		println!("total_blk_count={}", sb.block_total);
		println!("fat_blk_count={}", sb.fat_blocks);
		println!("rdir_blk={}", sb.root_index);
		println!("data_blk={}", sb.data_start);
		println!("data_blk_count={}", sb.data_count);
		println!("fat_free_ratio={}/{}", state.fat.free_count(), state.fat.len());
		println!("rdir_free_ratio={}/{}", MAX_FILES - state.directory.occupied_count(), MAX_FILES);
		Ok(())
	}

	/// Creates an empty file named `name`.
	pub fn create(&mut self, name: &str) -> Result<()> {
		let state = self.state_mut()?;
		state.directory.create(name)?;
		Ok(())
	}

	/// Deletes `name`, freeing its chain. Refused while any descriptor
	/// referencing the file is open.
	pub fn delete(&mut self, name: &str) -> Result<()> {
		let state = self.state_mut()?;
		let slot = state.directory.find(name)?;
		if state.open_files.is_open_at(slot) {
			return Err(FsError::Busy);
		}
		state.directory.delete(&mut state.fat, name)
	}

	/// Prints one line per occupied directory slot.
	pub fn ls(&self) -> Result<()> {
		let state = self.state()?;
		for entry in state.directory.occupied() {
			println!("file: {}, size: {}, data_blk: {}", entry.name(), entry.size, entry.first_block);
		}
		Ok(())
	}

	/// Opens `name`, returning a fresh descriptor positioned at offset 0.
	pub fn open(&mut self, name: &str) -> Result<usize> {
		let state = self.state_mut()?;
		let slot = state.directory.find(name)?;
		let entry = state.directory.entry(slot);
		state.open_files.open(slot, entry.size, entry.first_block)
	}

	/// Closes `fd`.
	pub fn close(&mut self, fd: usize) -> Result<()> {
		self.state_mut()?.open_files.close(fd)
	}

	/// Returns the cached size of the file open on `fd`.
	pub fn stat(&self, fd: usize) -> Result<u32> {
		self.state()?.open_files.stat(fd)
	}

	/// Moves `fd`'s cursor to `offset`.
	pub fn lseek(&mut self, fd: usize, offset: u32) -> Result<()> {
		self.state_mut()?.open_files.lseek(fd, offset)
	}

	/// Reads into `buf`, starting at `fd`'s cursor and truncated by EOF.
	pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
		let state = self.state_mut()?;
		let data_start = state.superblock.data_start;
		let of = state.open_files.get_mut(fd)?;
		engine::read(&mut state.device, data_start, &state.fat, of, buf)
	}

	/// Writes `data`, starting at `fd`'s cursor, extending the file and its
	/// directory entry as needed. Returns a short count if the device runs
	/// out of space; never fails because of that.
	pub fn write(&mut self, fd: usize, data: &[u8]) -> Result<usize> {
		let state = self.state_mut()?;
		let data_start = state.superblock.data_start;
		let dir_index = state.open_files.get(fd)?.dir_index;

		let Mounted { device, fat, directory, open_files, .. } = state;
		let of = open_files.get_mut(fd)?;
		let dir_entry = directory.entry_mut(dir_index);
		engine::write(device, data_start, fat, dir_entry, of, data)
	}
}

impl Default for FileSystem {
	fn default() -> Self {
		Self::new()
	}
}

const _: () = assert!(BLOCK_SIZE == 4096);
const _: () = assert!(EOC == 0xFFFF);

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::atomic::AtomicU32;
	use std::sync::atomic::Ordering;

	static COUNTER: AtomicU32 = AtomicU32::new(0);

	fn temp_path() -> std::path::PathBuf {
		let id = COUNTER.fetch_add(1, Ordering::Relaxed);
		std::env::temp_dir().join(format!("fs_lib_test_{}_{}.img", std::process::id(), id))
	}

	fn fresh_image(data_blocks: u16) -> std::path::PathBuf {
		let path = temp_path();
		format::format(&path, data_blocks).unwrap();
		path
	}

	#[test]
	fn mount_refuses_double_mount() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		assert!(matches!(fs.mount(&path), Err(FsError::AlreadyMounted)));
		fs.umount().unwrap();
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn umount_refuses_without_mount() {
		let mut fs = FileSystem::new();
		assert!(matches!(fs.umount(), Err(FsError::NotMounted)));
	}

	#[test]
	fn umount_refuses_with_open_descriptors() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		fs.create("a").unwrap();
		fs.open("a").unwrap();
		assert!(matches!(fs.umount(), Err(FsError::Busy)));
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn create_write_stat_ls_roundtrip() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		fs.create("a").unwrap();
		let fd = fs.open("a").unwrap();
		let n = fs.write(fd, b"Hello").unwrap();
		assert_eq!(n, 5);
		assert_eq!(fs.stat(fd).unwrap(), 5);
		fs.close(fd).unwrap();
		fs.umount().unwrap();
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn delete_refuses_while_open() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		fs.create("a").unwrap();
		fs.open("a").unwrap();
		assert!(matches!(fs.delete("a"), Err(FsError::Busy)));
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn delete_restores_free_ratio() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		fs.create("a").unwrap();
		let fd = fs.open("a").unwrap();
		fs.write(fd, &[0u8; 10000]).unwrap();
		fs.close(fd).unwrap();
		fs.delete("a").unwrap();

		let state = fs.state().unwrap();
		assert_eq!(state.fat.free_count(), state.fat.len() - 1);
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn persistence_across_mount_cycles() {
		let path = fresh_image(5);
		{
			let mut fs = FileSystem::new();
			fs.mount(&path).unwrap();
			fs.create("a").unwrap();
			let fd = fs.open("a").unwrap();
			fs.write(fd, b"persisted").unwrap();
			fs.close(fd).unwrap();
			fs.umount().unwrap();
		}
		{
			let mut fs = FileSystem::new();
			fs.mount(&path).unwrap();
			let fd = fs.open("a").unwrap();
			let mut buf = [0u8; 9];
			fs.read(fd, &mut buf).unwrap();
			assert_eq!(&buf, b"persisted");
			fs.umount().unwrap();
		}
		std::fs::remove_file(&path).unwrap();
	}

	#[test]
	fn info_ratio_is_stable_across_mount_cycles() {
		let path = fresh_image(5);
		let mut fs = FileSystem::new();
		fs.mount(&path).unwrap();
		let before = (fs.state().unwrap().fat.free_count(), fs.state().unwrap().directory.occupied_count());
		fs.umount().unwrap();
		fs.mount(&path).unwrap();
		let after = (fs.state().unwrap().fat.free_count(), fs.state().unwrap().directory.occupied_count());
		assert_eq!(before, after);
		fs.umount().unwrap();
		std::fs::remove_file(&path).unwrap();
	}
}
