use crate::daemon::signals;
use crate::daemon::socket_context::{Progress, SockContext};
use crate::engine::Language;
use nix::sys::select::{select, FdSet};
use nix::sys::time::{TimeVal, TimeValLike};
use std::collections::VecDeque;
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Condvar, Mutex};

/// Shared dispatch queue the accept loop round-robins new connections into,
/// one per worker. Mirrors `worker_context_t`'s `sock_contexts` list guarded
/// by a mutex/condvar pair, minus the condvar's wake-on-empty role: our
/// worker loop already wakes periodically on the `select` timeout, so new
/// connections are picked up within that window without needing a dedicated
/// wakeup when the queue is otherwise idle.
pub struct Dispatch {
	queue: Mutex<VecDeque<TcpStream>>,
	signal: Condvar,
}

impl Dispatch {
	pub fn new() -> Arc<Self> {
		Arc::new(Self { queue: Mutex::new(VecDeque::new()), signal: Condvar::new() })
	}

	pub fn push(&self, stream: TcpStream) {
		let mut queue = self.queue.lock().expect("dispatch queue mutex poisoned");
		queue.push_back(stream);
		self.signal.notify_one();
	}

	fn drain(&self) -> Vec<TcpStream> {
		let mut queue = self.queue.lock().expect("dispatch queue mutex poisoned");
		queue.drain(..).collect()
	}

	/// Block until a connection arrives or `timeout` elapses, then drain
	/// whatever is queued. Used only while this worker has no connections of
	/// its own to `select` on.
	fn wait_then_drain(&self, timeout: std::time::Duration) -> Vec<TcpStream> {
		let queue = self.queue.lock().expect("dispatch queue mutex poisoned");
		let (mut queue, _timed_out) = self.signal.wait_timeout_while(queue, timeout, |q| q.is_empty()).expect("dispatch queue mutex poisoned");
		queue.drain(..).collect()
	}
}

const SELECT_TIMEOUT_MS: i64 = 500;

/// One worker's event loop: repeatedly select over every connection this
/// worker owns plus a timeout, pump whichever are ready, and drop any that
/// finished or errored. Runs until a shutdown signal is noted.
pub fn run(dispatch: Arc<Dispatch>, lang: Language, max_clients: usize) {
	let mut contexts: Vec<SockContext> = Vec::with_capacity(max_clients);

	loop {
		if signals::peek_last_signal() != 0 {
			log::info!("worker shutting down on signal");
			return;
		}

		for stream in dispatch.drain() {
			if contexts.len() >= max_clients {
				log::warn!("dropping connection: worker at max_clients ({max_clients})");
				continue;
			}
			match SockContext::new(stream) {
				Ok(ctx) => contexts.push(ctx),
				Err(err) => log::warn!("failed to prepare connection: {err}"),
			}
		}

		if contexts.is_empty() {
			for stream in dispatch.wait_then_drain(std::time::Duration::from_millis(SELECT_TIMEOUT_MS as u64)) {
				match SockContext::new(stream) {
					Ok(ctx) => contexts.push(ctx),
					Err(err) => log::warn!("failed to prepare connection: {err}"),
				}
			}
			continue;
		}

		let mut read_fds = FdSet::new();
		let mut write_fds = FdSet::new();
		let mut highest = 0;
		for ctx in &contexts {
			let fd = ctx.as_raw_fd();
			highest = highest.max(fd);
			if ctx.wants_read() {
				read_fds.insert(fd);
			} else {
				write_fds.insert(fd);
			}
		}

		let mut timeout = TimeVal::milliseconds(SELECT_TIMEOUT_MS);
		let ready = select(highest + 1, &mut read_fds, &mut write_fds, None, &mut timeout);
		let (read_fds, write_fds) = match ready {
			Ok(_) => (read_fds, write_fds),
			Err(nix::Error::EINTR) => continue,
			Err(err) => {
				log::error!("select failed: {err}");
				continue;
			}
		};

		let mut finished = Vec::new();
		for (idx, ctx) in contexts.iter_mut().enumerate() {
			let fd = ctx.as_raw_fd();
			if !read_fds.contains(fd) && !write_fds.contains(fd) {
				continue;
			}
			match ctx.pump(&lang) {
				Ok(Progress::Pending) => (),
				Err(err) => {
					log::warn!("connection error: {err}");
					finished.push(idx);
				}
			}
		}
		for idx in finished.into_iter().rev() {
			contexts.remove(idx);
		}
	}
}
