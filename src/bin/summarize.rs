use clap::Parser;
use std::process::ExitCode;
use summarizerd::{cli, cli::BatchArgs, engine};

fn main() -> ExitCode {
	let args = BatchArgs::parse();
	let ratio = args.ratio();
	if ratio <= 0.0 {
		eprintln!("Ratio cannot be 0.0");
		return ExitCode::from(1);
	}

	let dictionary = cli::default_dictionary_path(args.dictionary.clone());
	let lang = match engine::Language::load(&dictionary) {
		Ok(lang) => lang,
		Err(err) => {
			eprintln!("could not load dictionary {}: {err}", dictionary.display());
			return ExitCode::from(1);
		}
	};

	match engine::summarize(&args.input, &lang, ratio) {
		Ok(summary) => {
			println!("{summary}");
			ExitCode::from(0)
		}
		Err(err) => {
			eprintln!("{err}");
			ExitCode::from(1)
		}
	}
}
