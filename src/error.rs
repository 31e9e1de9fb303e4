use std::fmt;
use std::io;

/// Errors that arise from the summarization engine itself, as opposed to I/O
/// failures while reading a source file or a dictionary.
#[derive(Debug)]
pub enum EngineError {
	/// The dictionary document had a structure `roxmltree` could parse but that
	/// doesn't match the expected `dictionary`/`stemmer`/`parser`/`exclude` shape.
	InvalidDictionary(String),
	/// A `pre|post` style rule had a right-hand side longer than its left-hand
	/// side, which would grow the word instead of reducing it.
	InvalidRule(String),
	/// The ratio requested for a summary was outside `(0.0, 1.0]`.
	InvalidRatio(f32),
	/// Reading or mapping the source article failed.
	Article(io::Error),
}

impl fmt::Display for EngineError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidDictionary(msg) => write!(f, "invalid dictionary: {msg}"),
			Self::InvalidRule(rule) => write!(f, "invalid rule: {rule}"),
			Self::InvalidRatio(ratio) => write!(f, "invalid ratio: {ratio}"),
			Self::Article(err) => write!(f, "could not read article: {err}"),
		}
	}
}

impl std::error::Error for EngineError {}

impl From<EngineError> for io::Error {
	fn from(err: EngineError) -> Self {
		io::Error::new(io::ErrorKind::InvalidData, err)
	}
}

/// Mirrors `exit_status_t` from the original daemon: the worker's internal
/// notion of how it stopped, independent of the OS exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
	Ok,
	CantRecover,
	Crash,
}

/// Mirrors `proto_status_t`: what went wrong while servicing one connection.
/// `PROTO_INVALID` (a schema violation) isn't a variant here because it never
/// propagates as an error value — `SockContext::pump` handles it inline by
/// transitioning straight to a `Writing` phase carrying the error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoError {
	PeerLost,
	Internal,
}

impl fmt::Display for ProtoError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::PeerLost => write!(f, "peer closed the connection"),
			Self::Internal => write!(f, "internal error"),
		}
	}
}
