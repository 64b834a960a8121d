//! `fsconsole` mounts one image and dispatches commands against it,
//! printing results in the same formats the public API's `info`/`ls`
//! operations use. It exists purely to drive the library interactively or
//! from a script; it holds no filesystem logic of its own.

use fs::FileSystem;
use std::env;
use std::path::PathBuf;
use std::process::exit;
use utils::prompt::prompt;

/// Structure storing command line arguments.
#[derive(Default)]
struct Args {
	/// The name of the current program used in command line.
	prog: String,

	/// If true, print command line help.
	help: bool,

	/// The path to the image to mount.
	image_path: Option<PathBuf>,
}

fn parse_args() -> Args {
	let mut args: Args = Default::default();
	let mut iter = env::args();

	args.prog = iter.next().unwrap_or("fsconsole".to_owned());

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"-h" | "--help" => args.help = true,
			_ => args.image_path = Some(PathBuf::from(arg)),
		}
	}

	args
}

fn print_usage(prog: &str) {
	println!("usage: {} <image>", prog);
	println!("Commands: info, ls, create <name>, delete <name>, open <name>,");
	println!("          close <fd>, read <fd> <count>, write <fd> <text>,");
	println!("          seek <fd> <offset>, stat <fd>, quit");
}

/// Dispatches one command line against the mounted filesystem. Returns
/// `false` when the console should exit.
fn dispatch(fsys: &mut FileSystem, line: &str) -> bool {
	let mut words = line.split_whitespace();
	let Some(cmd) = words.next() else {
		return true;
	};

	let result = match cmd {
		"quit" | "exit" => return false,

		"info" => fsys.info(),
		"ls" => fsys.ls(),

		"create" => match words.next() {
			Some(name) => fsys.create(name),
			None => {
				eprintln!("usage: create <name>");
				return true;
			}
		},

		"delete" => match words.next() {
			Some(name) => fsys.delete(name),
			None => {
				eprintln!("usage: delete <name>");
				return true;
			}
		},

		"open" => match words.next() {
			Some(name) => fsys.open(name).map(|fd| println!("fd={}", fd)),
			None => {
				eprintln!("usage: open <name>");
				return true;
			}
		},

		"close" => match words.next().and_then(|s| s.parse().ok()) {
			Some(fd) => fsys.close(fd),
			None => {
				eprintln!("usage: close <fd>");
				return true;
			}
		},

		"stat" => match words.next().and_then(|s| s.parse().ok()) {
			Some(fd) => fsys.stat(fd).map(|size| println!("size={}", size)),
			None => {
				eprintln!("usage: stat <fd>");
				return true;
			}
		},

		"seek" => {
			let fd = words.next().and_then(|s| s.parse().ok());
			let offset = words.next().and_then(|s| s.parse().ok());
			match (fd, offset) {
				(Some(fd), Some(offset)) => fsys.lseek(fd, offset),
				_ => {
					eprintln!("usage: seek <fd> <offset>");
					return true;
				}
			}
		}

		"read" => {
			let fd = words.next().and_then(|s| s.parse().ok());
			let count = words.next().and_then(|s| s.parse::<usize>().ok());
			match (fd, count) {
				(Some(fd), Some(count)) => {
					let mut buf = vec![0u8; count];
					fsys.read(fd, &mut buf).map(|n| {
						println!("{}", String::from_utf8_lossy(&buf[..n]));
					})
				}
				_ => {
					eprintln!("usage: read <fd> <count>");
					return true;
				}
			}
		}

		"write" => {
			let fd = words.next().and_then(|s| s.parse().ok());
			let text = words.collect::<Vec<_>>().join(" ");
			match fd {
				Some(fd) => fsys.write(fd, text.as_bytes()).map(|n| println!("wrote {}", n)),
				None => {
					eprintln!("usage: write <fd> <text>");
					return true;
				}
			}
		}

		_ => {
			eprintln!("unknown command `{}` (try `quit` to exit)", cmd);
			return true;
		}
	};

	if let Err(e) = result {
		eprintln!("error: {}", e);
	}
	true
}

fn main() {
	let args = parse_args();
	if args.help {
		print_usage(&args.prog);
		return;
	}

	let image_path = args.image_path.unwrap_or_else(|| {
		eprintln!("{}: specify path to an image", args.prog);
		exit(1);
	});

	let mut fsys = FileSystem::new();
	if let Err(e) = fsys.mount(&image_path) {
		eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
		exit(1);
	}

	while let Some(line) = prompt(Some("fsconsole> "), false) {
		if !dispatch(&mut fsys, &line) {
			break;
		}
	}

	if let Err(e) = fsys.umount() {
		eprintln!("{}: {}", args.prog, e);
		exit(1);
	}
}
