use std::io::{Cursor, Read};

pub const PROTO: u16 = 0x1421;
pub const VERSION: u16 = 0x1;
pub const DEFAULT_PORT: u16 = 9872;
pub const MAX_FILENAME_LEN: usize = 256;

pub const REQUEST_HEADER_LEN: usize = 12;
pub const RESPONSE_HEADER_LEN: usize = 12;
pub const ERROR_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
	Summary = 0,
	ErrorInvalidRequest = 1,
	ErrorInternal = 2,
}

impl ResponseStatus {
	pub fn from_u32(value: u32) -> Option<Self> {
		match value {
			0 => Some(Self::Summary),
			1 => Some(Self::ErrorInvalidRequest),
			2 => Some(Self::ErrorInternal),
			_ => None,
		}
	}
}

/// A parsed, validated request header. The filename itself follows in the
/// stream and is read separately (see [`crate::daemon::worker`]).
///
/// `ratio` is the percentage in `[0, 100]` exactly as it travels on the
/// wire (see SPEC_FULL §4.6) — callers that feed it to [`crate::engine`]
/// must divide by 100 first, the same conversion `BatchArgs::ratio` applies
/// to its own `-r` flag.
#[derive(Debug, Clone, Copy)]
pub struct RequestHeader {
	pub proto: u16,
	pub ver: u16,
	pub ratio: f32,
	pub filename_len: u32,
}

impl RequestHeader {
	/// Parse a 12-byte big-endian request header. Does not validate `proto`,
	/// `ver`, or `filename_len` against policy — that's the caller's job, the
	/// same way `read_summary_request` separates framing from validation.
	pub fn decode(buf: &[u8; REQUEST_HEADER_LEN]) -> Self {
		let mut cur = Cursor::new(&buf[..]);
		let proto = read_u16(&mut cur);
		let ver = read_u16(&mut cur);
		let ratio_bits = read_u32(&mut cur);
		let filename_len = read_u32(&mut cur);
		RequestHeader { proto, ver, ratio: f32::from_bits(ratio_bits), filename_len }
	}

	pub fn is_valid(&self) -> bool {
		self.proto == PROTO
			&& self.ver == VERSION
			&& self.ratio >= 0.0
			&& self.ratio <= 100.0
			&& self.filename_len > 0
			&& (self.filename_len as usize) <= MAX_FILENAME_LEN
	}
}

pub fn encode_summary_response(summary: &str) -> Vec<u8> {
	let mut out = Vec::with_capacity(RESPONSE_HEADER_LEN + summary.len());
	out.extend_from_slice(&PROTO.to_be_bytes());
	out.extend_from_slice(&VERSION.to_be_bytes());
	out.extend_from_slice(&(ResponseStatus::Summary as u32).to_be_bytes());
	out.extend_from_slice(&(summary.len() as u32).to_be_bytes());
	out.extend_from_slice(summary.as_bytes());
	out
}

pub fn encode_error_response(status: ResponseStatus) -> [u8; ERROR_HEADER_LEN] {
	let mut out = [0u8; ERROR_HEADER_LEN];
	out[0..2].copy_from_slice(&PROTO.to_be_bytes());
	out[2..4].copy_from_slice(&VERSION.to_be_bytes());
	out[4..8].copy_from_slice(&(status as u32).to_be_bytes());
	out
}

fn read_u16(cur: &mut Cursor<&[u8]>) -> u16 {
	let mut buf = [0u8; 2];
	cur.read_exact(&mut buf).expect("fixed-size buffer");
	u16::from_be_bytes(buf)
}

fn read_u32(cur: &mut Cursor<&[u8]>) -> u32 {
	let mut buf = [0u8; 4];
	cur.read_exact(&mut buf).expect("fixed-size buffer");
	u32::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_header_round_trips_ratio_bits() {
		let mut buf = [0u8; REQUEST_HEADER_LEN];
		buf[0..2].copy_from_slice(&PROTO.to_be_bytes());
		buf[2..4].copy_from_slice(&VERSION.to_be_bytes());
		buf[4..8].copy_from_slice(&0.3f32.to_bits().to_be_bytes());
		buf[8..12].copy_from_slice(&9u32.to_be_bytes());

		let header = RequestHeader::decode(&buf);
		assert_eq!(header.proto, PROTO);
		assert_eq!(header.ver, VERSION);
		assert!((header.ratio - 0.3).abs() < f32::EPSILON);
		assert_eq!(header.filename_len, 9);
		assert!(header.is_valid());
	}

	#[test]
	fn a_ratio_of_exactly_zero_is_a_valid_request() {
		// spec.md §4.6's wire ratio range is the inclusive [0, 100] the
		// original validates with `ratio > 100 || ratio < 0`; only the batch
		// CLI rejects a zero ratio as a usage error.
		let mut buf = [0u8; REQUEST_HEADER_LEN];
		buf[0..2].copy_from_slice(&PROTO.to_be_bytes());
		buf[2..4].copy_from_slice(&VERSION.to_be_bytes());
		buf[4..8].copy_from_slice(&0.0f32.to_bits().to_be_bytes());
		buf[8..12].copy_from_slice(&9u32.to_be_bytes());
		assert!(RequestHeader::decode(&buf).is_valid());
	}

	#[test]
	fn rejects_wrong_proto() {
		let mut buf = [0u8; REQUEST_HEADER_LEN];
		buf[0..2].copy_from_slice(&0xDEADu16.to_be_bytes());
		buf[2..4].copy_from_slice(&VERSION.to_be_bytes());
		buf[4..8].copy_from_slice(&0.3f32.to_bits().to_be_bytes());
		buf[8..12].copy_from_slice(&9u32.to_be_bytes());
		assert!(!RequestHeader::decode(&buf).is_valid());
	}

	#[test]
	fn encodes_summary_response_header_and_body() {
		let encoded = encode_summary_response("hello");
		assert_eq!(&encoded[0..2], &PROTO.to_be_bytes());
		assert_eq!(&encoded[8..12], &5u32.to_be_bytes());
		assert_eq!(&encoded[12..], b"hello");
	}
}
