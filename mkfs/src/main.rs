//! The `mkfs` tool creates a fresh, empty filesystem image.

use fs::format;
use std::env;
use std::path::PathBuf;
use std::process::exit;
use utils::disk::get_disk_size;
use utils::prompt::prompt;
use utils::util::ByteSize;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// If true, print command line help.
	help: bool,

	/// The path to the device or image file on which the filesystem will be created.
	device_path: Option<PathBuf>,

	/// The requested number of data blocks. If absent, derived from the device's size.
	data_blocks: Option<u16>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or("mkfs".to_owned());

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"-h" | "--help" => args.help = true,

			"-n" | "--blocks" => {
				let count = iter.next().unwrap_or_else(|| {
					eprintln!("{}: {} requires a value", args.prog, arg);
					exit(1);
				});
				args.data_blocks = Some(count.parse().unwrap_or_else(|_| {
					eprintln!("{}: invalid block count `{}`", args.prog, count);
					exit(1);
				}));
			}

			// TODO handle case when several devices are given
			_ => args.device_path = Some(PathBuf::from(arg)),
		}
	}

	args
}

fn print_usage(prog: &str) {
	println!("usage: {} [-n data_blocks] <device>", prog);
	println!("Creates a fresh ECS150FS image on <device>.");
	println!("-n, --blocks <count>    number of data blocks (default: derived from device size)");
}

fn main() {
	let args = parse_args();
	if args.help {
		print_usage(&args.prog);
		return;
	}

	let device_path = args.device_path.unwrap_or_else(|| {
		eprintln!("{}: specify path to a device", args.prog);
		exit(1);
	});

	if format::is_formatted(&device_path) {
		println!("{} already contains an ECS150FS image", device_path.display());
		let confirm = prompt(Some("Proceed anyway? (y/N) "), false)
			.map(|s| s.to_lowercase() == "y")
			.unwrap_or(false);
		if !confirm {
			eprintln!("Abort.");
			exit(1);
		}
	}

	let data_blocks = args.data_blocks.unwrap_or_else(|| {
		let sectors = get_disk_size(&device_path).unwrap_or_else(|e| {
			eprintln!("{}: {}: {}", args.prog, device_path.display(), e);
			exit(1);
		});
		let bytes = sectors * 512;
		(bytes / fs::device::BLOCK_SIZE as u64).min(u16::MAX as u64) as u16
	});

	if data_blocks == 0 {
		eprintln!("{}: {}: unable to determine a data block count", args.prog, device_path.display());
		exit(1);
	}

	format::format(&device_path, data_blocks).unwrap_or_else(|e| {
		eprintln!("{}: failed to create filesystem: {}", args.prog, e);
		exit(1);
	});

	let size = ByteSize(data_blocks as u64 * fs::device::BLOCK_SIZE as u64);
	println!("{}: created ECS150FS image with {} data blocks ({})", args.prog, data_blocks, size);
}
