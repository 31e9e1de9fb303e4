use crate::daemon::signals;
use crate::daemon::worker::Dispatch;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};
use std::io;
use std::net::TcpListener;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const BIND_RETRIES: u32 = 5;
const BIND_RETRY_DELAY: Duration = Duration::from_secs(1);
const SELECT_TIMEOUT_MS: i64 = 500;

/// Bind the listening socket, retrying a fixed number of times a second
/// apart (not CLI-tunable, see SPEC_FULL §9 Design Notes) before giving up.
pub fn bind(port: u16) -> io::Result<TcpListener> {
	let mut last_err = None;
	for attempt in 1..=BIND_RETRIES {
		match TcpListener::bind(("0.0.0.0", port)) {
			Ok(listener) => {
				listener.set_nonblocking(true)?;
				return Ok(listener);
			}
			Err(err) => {
				log::warn!("bind attempt {attempt}/{BIND_RETRIES} on port {port} failed: {err}");
				last_err = Some(err);
				thread::sleep(BIND_RETRY_DELAY);
			}
		}
	}
	Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrInUse, "could not bind listening socket")))
}

/// Accept connections non-blockingly, handing each one to the next worker's
/// dispatch queue in round-robin order, until a shutdown signal is noted.
pub fn accept_loop(listener: TcpListener, workers: Vec<Arc<Dispatch>>) {
	let mut next_worker = 0usize;
	loop {
		if signals::peek_last_signal() != 0 {
			log::info!("listener shutting down on signal");
			return;
		}

		let mut read_fds = FdSet::new();
		let fd = listener.as_raw_fd();
		read_fds.insert(fd);
		let mut timeout = TimeVal::milliseconds(SELECT_TIMEOUT_MS);
		match select(fd + 1, &mut read_fds, None, None, &mut timeout) {
			Ok(0) => continue,
			Ok(_) => (),
			Err(nix::Error::EINTR) => continue,
			Err(err) => {
				log::error!("select on listening socket failed: {err}");
				continue;
			}
		}

		match listener.accept() {
			Ok((stream, _addr)) => {
				workers[next_worker].push(stream);
				next_worker = (next_worker + 1) % workers.len();
			}
			Err(err) if err.kind() == io::ErrorKind::WouldBlock => continue,
			Err(err) => log::warn!("accept failed: {err}"),
		}
	}
}
