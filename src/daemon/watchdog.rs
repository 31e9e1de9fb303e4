use crate::daemon::signals;
use crate::error::WorkerExit;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use std::io;

/// Fork off `main_proc` under supervision: if it dies from a crash signal,
/// refork it and keep watching; if it exits cleanly (or can't recover), stop
/// watching and propagate that status. Mirrors `handle_fork`/
/// `sighnd_handle_fork` in the original daemon, minus the signal-handler
/// indirection — `waitpid`'s own `WaitStatus::Signaled` tells us everything
/// the original's `SIGCHLD` handler had to go out of its way to record.
pub fn supervise(mut main_proc: impl FnMut() -> WorkerExit) -> io::Result<WorkerExit> {
	loop {
		// Safety: called before any additional threads are spawned in this
		// process generation.
		match unsafe { fork() }.map_err(io::Error::from)? {
			ForkResult::Child => {
				let exit = main_proc();
				std::process::exit(match exit {
					WorkerExit::Ok => 0,
					WorkerExit::CantRecover => 1,
					WorkerExit::Crash => 2,
				});
			}
			ForkResult::Parent { child } => match wait_forwarding_signals(child)? {
				WaitStatus::Exited(_, 0) => return Ok(WorkerExit::Ok),
				WaitStatus::Exited(_, 1) => return Ok(WorkerExit::CantRecover),
				WaitStatus::Exited(_, _) => return Ok(WorkerExit::Crash),
				WaitStatus::Signaled(_, signal, _) if signals::is_crash_signal(signal as i32) => {
					log::warn!("summarizerd child crashed with {signal}, respawning");
					continue;
				}
				WaitStatus::Signaled(..) => return Ok(WorkerExit::Ok),
				_ => return Ok(WorkerExit::CantRecover),
			},
		}
	}
}

/// Block in `waitpid` for `child`, but survive a signal landing on the
/// watchdog itself (e.g. a process-group-wide `SIGTERM`) instead of erroring
/// out of `supervise` with it unhandled: forward a non-crash signal to the
/// service so its own handlers run and it exits on its own terms, then keep
/// waiting. The watchdog installs no handler of its own beyond what
/// [`signals::install_handlers`] set up at startup (inherited across both
/// forks), so this is the only place it reacts to one.
fn wait_forwarding_signals(child: nix::unistd::Pid) -> io::Result<WaitStatus> {
	loop {
		match waitpid(child, None) {
			Ok(status) => return Ok(status),
			Err(nix::Error::EINTR) => {
				let signum = signals::last_signal();
				if signum != 0 && !signals::is_crash_signal(signum) {
					if let Ok(sig) = Signal::try_from(signum) {
						let _ = kill(child, sig);
					}
				}
			}
			Err(err) => return Err(io::Error::from(err)),
		}
	}
}
