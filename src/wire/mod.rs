pub mod codec;

pub use codec::{
	encode_error_response, encode_summary_response, RequestHeader, ResponseStatus, DEFAULT_PORT, ERROR_HEADER_LEN,
	MAX_FILENAME_LEN, PROTO, REQUEST_HEADER_LEN, RESPONSE_HEADER_LEN, VERSION,
};
