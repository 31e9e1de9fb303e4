use clap::Parser;
use std::process::ExitCode;
use summarizerd::{cli, cli::DaemonArgs, daemon, logger};

fn main() -> ExitCode {
	let args = DaemonArgs::parse();
	let dictionary = cli::default_dictionary_path(args.dictionary.clone());

	if let Err(err) = logger::init(&args.log_file, args.verbosity) {
		eprintln!("could not open log file {}: {err}", args.log_file.display());
		return ExitCode::from(1);
	}

	match daemon::run(args, dictionary) {
		Ok(code) => ExitCode::from(code as u8),
		Err(err) => {
			log::error!("summarizerd exiting: {err}");
			ExitCode::from(1)
		}
	}
}
