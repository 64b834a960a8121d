//! The read/write path: slices a caller buffer across block-aligned and
//! unaligned boundaries, extending the chain on write overflow.

use crate::device::BlockDevice;
use crate::device::BLOCK_SIZE;
use crate::directory::DirEntry;
use crate::error::FsError;
use crate::error::Result;
use crate::fat::Fat;
use crate::fat::EOC;
use crate::openfile::OpenFile;

/// Reads up to `buf.len()` bytes starting at the descriptor's cursor,
/// truncated to what remains in the file. Advances the cursor by the number
/// of bytes transferred.
pub fn read(dev: &mut BlockDevice, data_start: u16, fat: &Fat, of: &mut OpenFile, buf: &mut [u8]) -> Result<usize> {
	let count = buf.len().min((of.size - of.offset) as usize);
	if count == 0 {
		return Ok(0);
	}

	let mut block = fat.walk(of.head, of.offset as usize / BLOCK_SIZE);
	let mut block_off = of.offset as usize % BLOCK_SIZE;
	let mut done = 0usize;
	let mut scratch = [0u8; BLOCK_SIZE];

	while done < count {
		dev.read_block(data_start + block, &mut scratch)?;
		let n = (BLOCK_SIZE - block_off).min(count - done);
		buf[done..done + n].copy_from_slice(&scratch[block_off..block_off + n]);
		done += n;
		block_off = 0;
		if done < count {
			block = fat.next(block);
		}
	}

	of.offset += done as u32;
	Ok(done)
}

/// Writes `data` starting at the descriptor's cursor, overwriting existing
/// blocks in place and allocating new ones past the current end of file.
/// Stops early (returning a short count) if the device runs out of space;
/// running out of space is not an error.
pub fn write(
	dev: &mut BlockDevice,
	data_start: u16,
	fat: &mut Fat,
	dir_entry: &mut DirEntry,
	of: &mut OpenFile,
	data: &[u8],
) -> Result<usize> {
	let count = data.len();
	if count == 0 {
		return Ok(0);
	}

	let size = of.size as usize;
	let offset = of.offset as usize;

	let existing_blocks = if size == 0 { 0 } else { (size + BLOCK_SIZE - 1) / BLOCK_SIZE };
	let mut block_idx = offset / BLOCK_SIZE;
	let mut block_off = offset % BLOCK_SIZE;

	// The block addressing the current offset, if it is already allocated.
	let mut cur: Option<u16> = if block_idx < existing_blocks {
		Some(fat.walk(of.head, block_idx))
	} else {
		None
	};
	// The chain's current tail, used to link newly allocated blocks. `None`
	// both for an empty file and once extension starts consuming it.
	let mut tail: Option<u16> = if existing_blocks > 0 {
		Some(fat.walk(of.head, existing_blocks - 1))
	} else {
		None
	};

	let mut written = 0usize;
	let mut scratch = [0u8; BLOCK_SIZE];

	while written < count {
		let was_existing = cur.is_some();
		let block = match cur {
			Some(b) => b,
			None => {
				let new_block = match fat.allocate_free() {
					Ok(b) => b,
					Err(FsError::NoSpace) => break,
					Err(e) => return Err(e),
				};
				match tail {
					Some(t) => fat.set(t, new_block),
					None => of.head = new_block,
				}
				fat.set(new_block, EOC);
				tail = Some(new_block);
				new_block
			}
		};

		if was_existing {
			dev.read_block(data_start + block, &mut scratch)?;
		} else {
			scratch = [0u8; BLOCK_SIZE];
		}

		let n = (BLOCK_SIZE - block_off).min(count - written);
		scratch[block_off..block_off + n].copy_from_slice(&data[written..written + n]);
		dev.write_block(data_start + block, &scratch)?;

		written += n;
		block_off = 0;

		if written < count {
			cur = if was_existing {
				block_idx += 1;
				let next = fat.next(block);
				if next != EOC && block_idx < existing_blocks {
					Some(next)
				} else {
					None
				}
			} else {
				None
			};
		}
	}

	let new_offset = offset + written;
	let new_size = new_offset.max(size);

	of.offset = new_offset as u32;
	of.size = new_size as u32;
	dir_entry.size = new_size as u32;
	dir_entry.first_block = of.head;

	Ok(written)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::directory::Directory;
	use crate::superblock::Superblock;

	struct Fixture {
		dev: BlockDevice,
		sb: Superblock,
		fat: Fat,
		dir: Directory,
		path: std::path::PathBuf,
	}

	impl Drop for Fixture {
		fn drop(&mut self) {
			let _ = std::fs::remove_file(&self.path);
		}
	}

	fn fresh(data_count: u16) -> Fixture {
		use std::sync::atomic::AtomicU32;
		use std::sync::atomic::Ordering;
		static COUNTER: AtomicU32 = AtomicU32::new(0);
		let id = COUNTER.fetch_add(1, Ordering::Relaxed);

		let sb = Superblock::new(1, data_count);
		let path = std::env::temp_dir().join(format!(
			"fs_engine_test_{}_{}.img",
			std::process::id(),
			id
		));
		std::fs::write(&path, vec![0u8; sb.block_total as usize * BLOCK_SIZE]).unwrap();

		let mut dev = BlockDevice::open(&path).unwrap();
		sb.persist(&mut dev).unwrap();
		let fat = Fat::new_empty(data_count);
		fat.persist(&mut dev, &sb).unwrap();
		let dir = Directory::new_empty();
		dir.persist(&mut dev, &sb).unwrap();

		Fixture { dev, sb, fat, dir, path }
	}

	#[test]
	fn write_fits_in_one_block_no_allocation_beyond_first() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };

		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, b"Hello").unwrap();
		assert_eq!(n, 5);
		assert_eq!(of.size, 5);
		assert_eq!(of.head, 1);
		assert_eq!(f.fat.next(1), EOC);
	}

	#[test]
	fn spanning_write_builds_a_chain() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };

		let payload = vec![0x42u8; 10000];
		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, &payload).unwrap();
		assert_eq!(n, 10000);
		assert_eq!(of.size, 10000);

		let b0 = of.head;
		let b1 = f.fat.next(b0);
		let b2 = f.fat.next(b1);
		assert_eq!(f.fat.next(b2), EOC);
		assert_ne!(b0, b1);
		assert_ne!(b1, b2);
	}

	#[test]
	fn seek_and_overwrite_crossing_a_block_boundary() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };
		let payload = vec![0u8; 10000];
		write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, &payload).unwrap();

		of.offset = 4090;
		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, b"0123456789ABCDEF").unwrap();
		assert_eq!(n, 16);
		assert_eq!(of.size, 10000);

		of.offset = 4090;
		let mut buf = [0u8; 16];
		read(&mut f.dev, f.sb.data_start, &f.fat, &mut of, &mut buf).unwrap();
		assert_eq!(&buf, b"0123456789ABCDEF");
	}

	#[test]
	fn write_at_block_aligned_eof_is_pure_extension() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };
		let first = vec![0xAAu8; BLOCK_SIZE];
		write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, &first).unwrap();
		assert_eq!(of.offset as usize, BLOCK_SIZE);
		assert_eq!(of.size as usize, BLOCK_SIZE);

		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, b"more").unwrap();
		assert_eq!(n, 4);
		assert_eq!(of.size as usize, BLOCK_SIZE + 4);
	}

	#[test]
	fn disk_full_returns_short_write() {
		// `data_count` includes the reserved index-0 sentinel (always EOC,
		// never allocated), so a table of 5 entries has 4 usable blocks.
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };

		let payload = vec![0x7Eu8; 6 * BLOCK_SIZE];
		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, &payload).unwrap();
		assert_eq!(n, 4 * BLOCK_SIZE);
		assert_eq!(of.size as usize, 4 * BLOCK_SIZE);
		assert_eq!(f.fat.free_count(), 0);
	}

	#[test]
	fn zero_byte_write_is_a_noop() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };
		let n = write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, &[]).unwrap();
		assert_eq!(n, 0);
		assert_eq!(of.size, 0);
		assert_eq!(of.head, EOC);
	}

	#[test]
	fn read_past_eof_is_truncated() {
		let mut f = fresh(5);
		let slot = f.dir.create("a").unwrap();
		let mut of = OpenFile { dir_index: slot, size: 0, offset: 0, head: EOC };
		write(&mut f.dev, f.sb.data_start, &mut f.fat, f.dir.entry_mut(slot), &mut of, b"Hello").unwrap();

		of.offset = 2;
		let mut buf = [0u8; 100];
		let n = read(&mut f.dev, f.sb.data_start, &f.fat, &mut of, &mut buf).unwrap();
		assert_eq!(n, 3);
		assert_eq!(&buf[..3], b"llo");
	}
}
