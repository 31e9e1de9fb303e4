use nix::fcntl::{flock, FlockArg};
use nix::unistd::{dup2, fork, getpid, ForkResult};
use std::fs::OpenOptions;
use std::io::{self, Error, ErrorKind, Write as _};
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Exclusively lock and truncate the pid file, write our pid into it, and
/// hold the lock for the process's lifetime by leaking the `File` — the
/// lock is released when the process exits and the fd closes, which is
/// exactly the signal `check_existing_process` uses to decide whether a
/// previous daemon is still alive.
pub fn register_pid(pid_file: &Path) -> io::Result<()> {
	let mut file = OpenOptions::new().create(true).write(true).open(pid_file)?;
	match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
		Ok(()) => (),
		Err(nix::Error::EWOULDBLOCK) => {
			return Err(Error::new(ErrorKind::AlreadyExists, "another summarizerd instance is already running"))
		}
		Err(err) => return Err(io::Error::from(err)),
	}
	use std::io::Seek;
	file.set_len(0)?;
	file.seek(io::SeekFrom::Start(0))?;
	writeln!(file, "{}", getpid())?;
	file.flush()?;
	// Hold the lock for the process's lifetime.
	std::mem::forget(file);
	Ok(())
}

pub fn unregister_pid(pid_file: &Path) {
	let _ = std::fs::remove_file(pid_file);
}

/// Fork once and exit the original process, per spec.md:142's "the process
/// double-forks [once here]. The original parent exits. The first child is
/// the watchdog." The surviving child is that first child: it does not fork
/// again itself here — it goes on to run `watchdog::supervise`, whose own
/// fork is the *second* half of the pair, producing the grandchild service
/// process. Mirrors `summarizerd.c`'s `main()`, which forks once and hands
/// the child straight to `handle_fork()` (there is no `daemonize`-style
/// function in the original that forks twice, and no `setsid()` call either
/// — both would be redundant with `handle_fork`'s own fork).
pub fn detach() -> io::Result<()> {
	// Safety: fork() is safe here because we haven't spawned any threads yet —
	// detach() must run before the worker pool starts.
	match unsafe { fork() }.map_err(io::Error::from)? {
		ForkResult::Parent { .. } => std::process::exit(0),
		ForkResult::Child => Ok(()),
	}
}

/// Redirect the standard streams to `/dev/null`. Called only in the service
/// process (the grandchild `watchdog::supervise` forks off), mirroring
/// `handle_io_streams`, which the original calls from `main_proc` rather
/// than from the fork/detach step itself.
pub fn redirect_stdio_to_dev_null() -> io::Result<()> {
	let dev_null = OpenOptions::new().read(true).write(true).open("/dev/null")?;
	let fd = dev_null.as_raw_fd();
	dup2(fd, 0).map_err(io::Error::from)?;
	dup2(fd, 1).map_err(io::Error::from)?;
	dup2(fd, 2).map_err(io::Error::from)?;
	Ok(())
}
