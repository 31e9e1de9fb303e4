use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use nix::unistd::{sysconf, SysconfVar};
use std::fs::File;
use std::io::{Error, ErrorKind, Result};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr;

/// A private, writable mapping of a file's contents, with a cursor that walks
/// it word by word and overwrites the whitespace between words with `\0` as
/// it goes.
///
/// This is the in-place tokenization scheme `parse_article`'s
/// `STREAM_GET_WORD` macro used: rather than copying each word out, the
/// separators are nulled in the mapped buffer itself, turning it into a
/// sequence of nul-terminated runs. The grader's later pass over a sentence's
/// byte range has to tolerate interior nuls for exactly this reason — they
/// are the word boundaries, not garbage.
pub struct Stream {
	ptr: *mut u8,
	/// Length of the real file content within the mapping.
	len: usize,
	/// Full length of the mapping (page-rounded, with at least one trailing
	/// guard byte so the cursor never reads off the end).
	map_len: usize,
	pos: usize,
}

fn is_space(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

impl Stream {
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let file = File::open(path)?;
		let len = file.metadata()?.len() as usize;
		let page_size = sysconf(SysconfVar::PAGE_SIZE).ok().flatten().unwrap_or(4096) as usize;
		// Room for the content plus at least one nul guard byte, rounded up to
		// a whole page as the original's stream_create does.
		let map_len = ((len + 1 + page_size - 1) / page_size) * page_size;
		if len == 0 {
			return Err(Error::new(ErrorKind::InvalidInput, "cannot map an empty file"));
		}
		// Safety: addr NULL lets the kernel place the mapping; MAP_PRIVATE means
		// our in-place mutation below never reaches the backing file.
		let ptr = unsafe {
			mmap(ptr::null_mut(), map_len, ProtFlags::PROT_READ | ProtFlags::PROT_WRITE, MapFlags::MAP_PRIVATE, file.as_raw_fd(), 0)?
		};
		Ok(Self { ptr: ptr.cast(), len, map_len, pos: 0 })
	}

	fn bytes(&self) -> &[u8] {
		// Safety: the mapping is alive for `self`'s lifetime and map_len bytes
		// were mapped.
		unsafe { std::slice::from_raw_parts(self.ptr, self.map_len) }
	}

	fn bytes_mut(&mut self) -> &mut [u8] {
		unsafe { std::slice::from_raw_parts_mut(self.ptr, self.map_len) }
	}

	pub fn is_end(&self) -> bool {
		self.pos >= self.len
	}

	/// Skip any run of whitespace at the cursor without mutating it.
	pub fn skip_space(&mut self) {
		let bytes = self.bytes();
		while self.pos < self.len && is_space(bytes[self.pos]) {
			self.pos += 1;
		}
	}

	/// Read the next whitespace-delimited word, overwriting the whitespace run
	/// that follows it with nul bytes. Returns the word's byte range, the
	/// word itself, and whether that trailing whitespace run contained a
	/// `\n` or `\r` (a paragraph-break marker, per `STREAM_GET_WORD`).
	pub fn next_word(&mut self) -> Result<Option<(usize, usize, &str, bool)>> {
		self.skip_space();
		if self.is_end() {
			return Ok(None);
		}
		let start = self.pos;
		{
			let bytes = self.bytes();
			while self.pos < self.len && !is_space(bytes[self.pos]) {
				self.pos += 1;
			}
		}
		let end = self.pos;
		let mut saw_newline = false;
		{
			let bytes = self.bytes_mut();
			while self.pos < self.len && is_space(bytes[self.pos]) {
				if bytes[self.pos] == b'\n' || bytes[self.pos] == b'\r' {
					saw_newline = true;
				}
				bytes[self.pos] = 0;
				self.pos += 1;
			}
		}
		let word = std::str::from_utf8(&self.bytes()[start..end])
			.map_err(|_| Error::new(ErrorKind::InvalidData, "article is not valid utf-8"))?;
		Ok(Some((start, end, word, saw_newline)))
	}

	/// Walk a sentence's byte range exactly as the grader does: split on the
	/// embedded nuls that tokenization left behind, yielding each word in turn.
	pub fn words_in(&self, start: usize, end: usize) -> impl Iterator<Item = &str> {
		self.bytes()[start..end.min(self.map_len)].split(|&b| b == 0).filter_map(|w| {
			if w.is_empty() {
				None
			} else {
				std::str::from_utf8(w).ok()
			}
		})
	}

	pub fn offset(&self) -> usize {
		self.pos
	}
}

impl Drop for Stream {
	fn drop(&mut self) {
		// Safety: no references into the mapping outlive `self`.
		if let Err(err) = unsafe { munmap(self.ptr.cast(), self.map_len) } {
			log::warn!("munmap({:p}, {}) failed: {err}", self.ptr, self.map_len);
		}
	}
}
