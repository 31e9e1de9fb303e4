use nix::sys::signal::{raise, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::io;
use std::sync::atomic::{AtomicI32, Ordering};

/// The last signal number observed by a handler, communicated to the rest of
/// the process the same way the original's `g_sig` global did: a plain
/// integer flag written from an `extern "C"` handler and polled from normal
/// control flow (an `EINTR` return from `select`/`read`/`write`, or the main
/// loop's own periodic check). No `signalfd`: the handler itself is the
/// entire mechanism.
static LAST_SIGNAL: AtomicI32 = AtomicI32::new(0);

/// Signals that mean "a worker crashed", prompting the watchdog to respawn
/// it. Everything else is treated as an orderly shutdown request.
pub fn is_crash_signal(signum: i32) -> bool {
	matches!(
		Signal::try_from(signum),
		Ok(Signal::SIGSEGV | Signal::SIGQUIT | Signal::SIGABRT | Signal::SIGILL | Signal::SIGBUS | Signal::SIGFPE)
	)
}

pub fn last_signal() -> i32 {
	LAST_SIGNAL.swap(0, Ordering::Relaxed)
}

pub fn peek_last_signal() -> i32 {
	LAST_SIGNAL.load(Ordering::Relaxed)
}

extern "C" fn note_signal(signum: libc_int) {
	LAST_SIGNAL.store(signum, Ordering::Relaxed);
}

/// The crash-signal handler: note the signal the same way `note_signal`
/// does, then reset that signal's disposition to its default action and
/// re-raise it, so the process actually dies by signal and the OS-visible
/// cause of death is the crash signal itself (spec.md §4.10's "one-shot
/// handler ... re-raises by default disposition"). This is what lets
/// `watchdog::supervise` observe `WaitStatus::Signaled(_, crash_signal, _)`
/// and respawn, instead of the service merely noting the signal and running
/// on to a controlled, indistinguishable-from-clean exit.
extern "C" fn note_crash_signal(signum: libc_int) {
	LAST_SIGNAL.store(signum, Ordering::Relaxed);
	if let Ok(sig) = Signal::try_from(signum) {
		let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
		// Safety: resetting to the default disposition before re-raising is
		// the same one-shot pattern the original's crash handlers use — by
		// the time `raise` delivers the signal again, the default action
		// (core dump/terminate) is what runs, not this handler recursing.
		if unsafe { sigaction(sig, &default) }.is_ok() {
			let _ = raise(sig);
		}
	}
}

// nix doesn't re-export c_int as a stable path we want to depend on here, so
// alias it locally the way the rest of the crate names raw signal numbers.
#[allow(non_camel_case_types)]
type libc_int = std::os::raw::c_int;

/// Install handlers for the signals the daemon cares about: graceful-shutdown
/// signals (`TERM`/`INT`/`HUP`/`USR1`/`CHLD`, per SPEC_FULL §4.10 — `USR1` is
/// also how `initiate_quit` unblocks a worker or listener parked in a
/// blocking syscall), crash signals (noted, then re-raised with their
/// default disposition so the OS-level exit status reflects the crash — see
/// `note_crash_signal`), and `SIGPIPE` ignored so a client hanging up
/// mid-write doesn't kill the worker.
pub fn install_handlers() -> nix::Result<()> {
	let note = SigAction::new(SigHandler::Handler(note_signal), SaFlags::empty(), SigSet::empty());
	let note_crash = SigAction::new(SigHandler::Handler(note_crash_signal), SaFlags::empty(), SigSet::empty());
	unsafe {
		sigaction(Signal::SIGTERM, &note)?;
		sigaction(Signal::SIGINT, &note)?;
		sigaction(Signal::SIGHUP, &note)?;
		sigaction(Signal::SIGUSR1, &note)?;
		sigaction(Signal::SIGCHLD, &note)?;
		sigaction(Signal::SIGSEGV, &note_crash)?;
		sigaction(Signal::SIGQUIT, &note_crash)?;
		sigaction(Signal::SIGABRT, &note_crash)?;
		sigaction(Signal::SIGBUS, &note_crash)?;
		sigaction(Signal::SIGILL, &note_crash)?;
		sigaction(Signal::SIGFPE, &note_crash)?;
		sigaction(Signal::SIGPIPE, &SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty()))?;
	}
	Ok(())
}

pub fn to_io_error(err: nix::Error) -> io::Error {
	io::Error::from(err)
}
