//! Drives the worker's per-connection state machine over a real loopback
//! TCP socket, without the accept loop/worker threads/daemonization around
//! it, per SPEC_FULL §8's same-process harness note.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use summarizerd::daemon::socket_context::{Progress, SockContext};
use summarizerd::engine::language::{Language, Rule};
use summarizerd::wire::{self, ResponseStatus, REQUEST_HEADER_LEN};

fn lang() -> Language {
	Language {
		post1: vec![Rule { lhs: ".".to_string(), rhs: String::new() }],
		line_break: vec![".".to_string()],
		..Language::default()
	}
}

fn encode_request(ratio_percent: f32, filename: &str) -> (Vec<u8>, Vec<u8>) {
	let mut header = Vec::with_capacity(REQUEST_HEADER_LEN);
	header.extend_from_slice(&wire::PROTO.to_be_bytes());
	header.extend_from_slice(&wire::VERSION.to_be_bytes());
	header.extend_from_slice(&ratio_percent.to_bits().to_be_bytes());
	let mut name = filename.as_bytes().to_vec();
	name.push(0);
	header.extend_from_slice(&(name.len() as u32).to_be_bytes());
	(header, name)
}

fn connected_pair() -> (TcpStream, TcpStream) {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	let client = TcpStream::connect(addr).unwrap();
	let (server, _) = listener.accept().unwrap();
	(client, server)
}

#[test]
fn partial_request_resumes_at_the_filename_instead_of_re_reading_the_header() {
	let dir = tempfile::tempdir().unwrap();
	let article_path = dir.path().join("article.txt");
	std::fs::write(&article_path, "Cats run fast. Cats jump high.").unwrap();

	let expected = summarizerd::engine::summarize(&article_path, &lang(), 1.0).unwrap();

	let (mut client, server) = connected_pair();
	let mut ctx = SockContext::new(server).unwrap();

	let filename = article_path.to_str().unwrap();
	let (header, name) = encode_request(100.0, filename);

	// Only the 12-byte header arrives first; the worker must preserve its
	// partial progress (`req_offset` in the original) and come back for the
	// filename on the next readiness notification rather than re-reading
	// from byte zero.
	client.write_all(&header).unwrap();
	match ctx.pump(&lang()).unwrap() {
		Progress::Pending => {}
	}

	client.write_all(&name).unwrap();
	match ctx.pump(&lang()).unwrap() {
		Progress::Pending => {}
	}

	let mut response = vec![0u8; REQUEST_HEADER_LEN + expected.len()];
	client.read_exact(&mut response).unwrap();

	assert_eq!(&response[0..2], &wire::PROTO.to_be_bytes());
	assert_eq!(&response[2..4], &wire::VERSION.to_be_bytes());
	assert_eq!(u32::from_be_bytes(response[4..8].try_into().unwrap()), ResponseStatus::Summary as u32);
	assert_eq!(u32::from_be_bytes(response[8..12].try_into().unwrap()) as usize, expected.len());
	assert_eq!(&response[12..], expected.as_bytes());
}

#[test]
fn a_connection_is_reusable_for_a_second_request_after_the_first_response() {
	let dir = tempfile::tempdir().unwrap();
	let article_path = dir.path().join("article.txt");
	std::fs::write(&article_path, "One sentence here.").unwrap();
	let expected = summarizerd::engine::summarize(&article_path, &lang(), 1.0).unwrap();

	let (mut client, server) = connected_pair();
	let mut ctx = SockContext::new(server).unwrap();
	let filename = article_path.to_str().unwrap();

	for _ in 0..2 {
		let (header, name) = encode_request(100.0, filename);
		client.write_all(&header).unwrap();
		client.write_all(&name).unwrap();
		// A single pump drains both frames and the response in one call
		// since all of it is already buffered in the loopback socket.
		let _ = ctx.pump(&lang()).unwrap();

		let mut response = vec![0u8; REQUEST_HEADER_LEN + expected.len()];
		client.read_exact(&mut response).unwrap();
		assert_eq!(&response[12..], expected.as_bytes());
	}
}

#[test]
fn an_invalid_request_yields_the_eight_byte_error_frame_and_stays_connected() {
	let (mut client, server) = connected_pair();
	let mut ctx = SockContext::new(server).unwrap();

	let mut bad_header = Vec::with_capacity(REQUEST_HEADER_LEN);
	bad_header.extend_from_slice(&0xDEADu16.to_be_bytes()); // wrong proto
	bad_header.extend_from_slice(&wire::VERSION.to_be_bytes());
	bad_header.extend_from_slice(&1.0f32.to_bits().to_be_bytes());
	bad_header.extend_from_slice(&1u32.to_be_bytes());
	client.write_all(&bad_header).unwrap();

	let _ = ctx.pump(&lang()).unwrap();

	let mut response = [0u8; wire::ERROR_HEADER_LEN];
	client.read_exact(&mut response).unwrap();
	assert_eq!(&response[0..2], &wire::PROTO.to_be_bytes());
	assert_eq!(u32::from_be_bytes(response[4..8].try_into().unwrap()), ResponseStatus::ErrorInvalidRequest as u32);
}
