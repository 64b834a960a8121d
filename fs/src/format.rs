//! Lays a fresh, empty instance of the on-disk layout onto a blank file so
//! it becomes mountable. No `FileSystem` operation can produce the first
//! valid superblock/FAT/root-directory triple a mount requires; this is
//! that required collaborator.

use crate::device::BlockDevice;
use crate::device::BLOCK_SIZE;
use crate::directory::Directory;
use crate::error::Result;
use crate::fat::Fat;
use crate::superblock::SIGNATURE;
use crate::superblock::Superblock;
use std::path::Path;

const ENTRIES_PER_BLOCK: u16 = (BLOCK_SIZE / 2) as u16;

/// Number of FAT blocks needed to hold `data_count` two-byte entries.
fn fat_blocks_for(data_count: u16) -> u8 {
	let blocks = (data_count + ENTRIES_PER_BLOCK - 1) / ENTRIES_PER_BLOCK;
	blocks.max(1) as u8
}

/// Whether `path` already names a recognizable `ECS150FS` image, used to
/// guard against a silent, destructive reformat.
pub fn is_formatted(path: &Path) -> bool {
	let Ok(bytes) = std::fs::read(path) else {
		return false;
	};
	bytes.len() >= SIGNATURE.len() && bytes[..SIGNATURE.len()] == SIGNATURE
}

/// Creates a new image at `path` sized to hold `data_count` data blocks,
/// writing the FAT and root directory before the superblock so a process
/// that crashes mid-format never leaves a valid signature over an
/// inconsistent body.
pub fn format(path: &Path, data_count: u16) -> Result<()> {
	let fat_blocks = fat_blocks_for(data_count);
	let sb = Superblock::new(fat_blocks, data_count);

	std::fs::write(path, vec![0u8; sb.block_total as usize * BLOCK_SIZE])?;
	let mut dev = BlockDevice::open(path)?;

	Fat::new_empty(data_count).persist(&mut dev, &sb)?;
	Directory::new_empty().persist(&mut dev, &sb)?;
	sb.persist(&mut dev)?;
	Ok(())
}
