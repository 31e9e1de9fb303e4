pub mod lifecycle;
pub mod listener;
pub mod signals;
pub mod socket_context;
pub mod watchdog;
pub mod worker;

use crate::cli::DaemonArgs;
use crate::engine::Language;
use crate::error::WorkerExit;
use std::io;
use std::sync::Arc;

/// Start the daemon as directed by `args`, returning the process exit code
/// the caller (`main`) should use. In foreground mode this runs the listener
/// and worker pool directly and maps their internal status to an OS exit
/// code, since there is no watchdog process to interpret the sentinel. In
/// daemon mode this detaches, then supervises the listener/worker pool under
/// a watchdog that respawns it on crash.
pub fn run(args: DaemonArgs, dictionary: std::path::PathBuf) -> io::Result<i32> {
	signals::install_handlers().map_err(signals::to_io_error)?;

	let result = if args.foreground {
		main_proc(&args, &dictionary)
	} else {
		lifecycle::detach()?;
		// This process is now spec.md:142's "first child": the permanent
		// watchdog. `watchdog::supervise` does the *second* fork — the one
		// that produces the grandchild service process `main_proc` (including
		// the pid-file registration and stdio redirection inside it) actually
		// runs in. That's deliberate — the pid file must hold the pid of the
		// process that installs the shutdown signal handlers and can be
		// meaningfully signaled via `kill $(cat pidfile)`, not the watchdog's,
		// which does nothing but fork/waitpid in a loop. Each respawn
		// re-registers the new service pid.
		watchdog::supervise(|| main_proc(&args, &dictionary))?
	};

	lifecycle::unregister_pid(&args.pid_file);
	Ok(match result {
		WorkerExit::Ok => 0,
		WorkerExit::CantRecover => 1,
		WorkerExit::Crash => 2,
	})
}

/// Bind the listener, start one worker thread per configured worker (each
/// with its own `Language`, see SPEC_FULL §4.3.x), and run the accept loop on
/// the calling thread until a shutdown signal arrives.
fn main_proc(args: &DaemonArgs, dictionary: &std::path::Path) -> WorkerExit {
	if let Err(err) = lifecycle::register_pid(&args.pid_file) {
		log::error!("could not register pid file {}: {err}", args.pid_file.display());
		return WorkerExit::CantRecover;
	}

	// `handle_io_streams` in the original only runs for the actual service
	// process, not the fork/detach step — foreground mode keeps the caller's
	// stdio untouched.
	if !args.foreground {
		if let Err(err) = lifecycle::redirect_stdio_to_dev_null() {
			log::error!("could not redirect standard streams to /dev/null: {err}");
			return WorkerExit::CantRecover;
		}
	}

	let listener = match listener::bind(args.port) {
		Ok(listener) => listener,
		Err(err) => {
			log::error!("could not bind listening socket: {err}");
			return WorkerExit::CantRecover;
		}
	};

	let mut dispatches = Vec::with_capacity(args.workers());
	let mut handles = Vec::with_capacity(args.workers());
	for worker_id in 0..args.workers() {
		let lang = match Language::load(dictionary) {
			Ok(lang) => lang,
			Err(err) => {
				log::error!("worker {worker_id}: could not load dictionary: {err}");
				return WorkerExit::CantRecover;
			}
		};
		let dispatch = worker::Dispatch::new();
		let max_clients = args.max_clients();
		let worker_dispatch: Arc<worker::Dispatch> = Arc::clone(&dispatch);
		let handle = std::thread::Builder::new()
			.name(format!("summarizerd-worker-{worker_id}"))
			.spawn(move || worker::run(worker_dispatch, lang, max_clients))
			.expect("failed to spawn worker thread");
		dispatches.push(dispatch);
		handles.push(handle);
	}

	listener::accept_loop(listener, dispatches);

	for handle in handles {
		let _ = handle.join();
	}

	// The accept loop only returns once a signal has been noted. A crash
	// signal ordinarily kills the process outright via `note_crash_signal`'s
	// re-raise before this point is ever reached, which is what lets the
	// watchdog observe `WaitStatus::Signaled` and respawn; this is the
	// in-process fallback for the case where control does reach back here
	// (e.g. foreground mode, where there is no watchdog to observe a signal
	// death and the noted signal is the only record of what happened).
	if signals::is_crash_signal(signals::peek_last_signal()) {
		WorkerExit::Crash
	} else {
		WorkerExit::Ok
	}
}
