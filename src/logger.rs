use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write as _};
use std::path::Path;
use std::sync::Mutex;

/// Initialize the global logger, writing to `path` at the verbosity `level`
/// requests. `level` follows `summarizerd`'s `-v` flag: `1` disables logging
/// entirely and `7` is the most verbose.
pub fn init(path: &Path, level: u8) -> io::Result<()> {
	let file = OpenOptions::new().create(true).append(true).open(path)?;
	log::set_boxed_logger(Box::new(Logger(Mutex::new(file))))
		.map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
	log::set_max_level(level_filter(level));
	Ok(())
}

fn level_filter(level: u8) -> LevelFilter {
	match level {
		0 | 1 => LevelFilter::Off,
		2 | 3 => LevelFilter::Error,
		4 => LevelFilter::Warn,
		5 => LevelFilter::Info,
		6 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	}
}

struct Logger(Mutex<File>);

impl Log for Logger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if !self.enabled(record.metadata()) {
			return;
		}
		let mut file = match self.0.lock() {
			Ok(file) => file,
			Err(_) => return,
		};
		let mut dest = LineWriter::new(&mut *file);
		let _ = writeln!(
			dest,
			"[{level:>5}] {target}: {args}",
			level = record.level(),
			target = record.target(),
			args = record.args()
		);
		let _ = dest.flush();
	}

	fn flush(&self) {
		if let Ok(mut file) = self.0.lock() {
			let _ = file.flush();
		}
	}
}
