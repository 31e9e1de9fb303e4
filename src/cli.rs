use clap::Parser;
use std::path::PathBuf;

/// `summarizerd`: a daemon that accepts connections and returns extractive
/// summaries of the files clients name.
#[derive(Parser, Debug)]
#[command(name = "summarizerd")]
pub struct DaemonArgs {
	/// TCP port to listen on.
	#[arg(short = 'p', long, default_value_t = crate::wire::DEFAULT_PORT)]
	pub port: u16,

	/// Log file path.
	#[arg(short = 'l', long, default_value = "/var/log/summarizerd.log")]
	pub log_file: PathBuf,

	/// Log verbosity, 1 (quiet) through 7 (trace).
	#[arg(short = 'v', long, default_value_t = 3)]
	pub verbosity: u8,

	/// Maximum simultaneously connected clients per worker, up to 32.
	#[arg(short = 'n', long, default_value_t = 32)]
	pub max_clients: usize,

	/// Number of worker threads, up to 4.
	#[arg(short = 'w', long, default_value_t = 4)]
	pub workers: usize,

	/// Pid file path.
	#[arg(short = 'i', long, default_value = "/var/log/summarizerd.pid")]
	pub pid_file: PathBuf,

	/// Run in the foreground instead of double-forking into a daemon.
	#[arg(short = 'f', long)]
	pub foreground: bool,

	/// Dictionary XML path; defaults to the bundled English dictionary.
	#[arg(long)]
	pub dictionary: Option<PathBuf>,
}

impl DaemonArgs {
	pub fn max_clients(&self) -> usize {
		self.max_clients.min(32)
	}

	pub fn workers(&self) -> usize {
		self.workers.min(4)
	}
}

/// `summarize`: a one-shot batch summarizer.
#[derive(Parser, Debug)]
#[command(name = "summarize")]
pub struct BatchArgs {
	/// The file to summarize.
	#[arg(short = 'i', long)]
	pub input: PathBuf,

	/// Summary length as a percentage of the original (e.g. 30 for 30%).
	#[arg(short = 'r', long)]
	pub ratio_percent: f32,

	/// Dictionary XML path; defaults to the bundled English dictionary.
	#[arg(long)]
	pub dictionary: Option<PathBuf>,
}

impl BatchArgs {
	pub fn ratio(&self) -> f32 {
		self.ratio_percent / 100.0
	}
}

/// Resolve the dictionary path: an explicit `--dictionary`, or the
/// `SUMMARIZERD_DICT` environment variable, or the bundled default.
pub fn default_dictionary_path(explicit: Option<PathBuf>) -> PathBuf {
	if let Some(path) = explicit {
		return path;
	}
	if let Ok(path) = std::env::var("SUMMARIZERD_DICT") {
		return PathBuf::from(path);
	}
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/en.xml")
}
