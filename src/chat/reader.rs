//! Sentinel-terminated reader for the chat executable's stdout.
//!
//! The executable writes its response as UTF-8 text and marks the end of each
//! response with a single form-feed. [`read_until_sentinel`] decodes the
//! stream one byte at a time so multi-byte characters can be echoed to a
//! terminal as soon as they are complete.

use std::io::{self, Read, Write};

/// Marks the end of one response in the child's output stream.
pub const SENTINEL: char = '\x0c';

/// Longest UTF-8 encoding of a single code point.
const MAX_CHAR_BYTES: usize = 4;

/// Read bytes until the sentinel is decoded, returning the lines seen so far
/// joined with `\n`.
///
/// When `echo` is given, every decoded character (newlines included) is
/// written and flushed to it as it arrives. Bytes that fail to decode are held
/// until they form a complete character; once more than four bytes are held
/// without a successful decode they are dropped.
///
/// Returns [`io::ErrorKind::UnexpectedEof`] if the stream closes before the
/// sentinel arrives.
pub fn read_until_sentinel<R: Read>(
    source: &mut R,
    mut echo: Option<&mut dyn Write>,
) -> io::Result<String> {
    let mut lines = vec![String::new()];
    let mut pending: Vec<u8> = Vec::with_capacity(MAX_CHAR_BYTES + 1);
    let mut byte = [0u8; 1];

    loop {
        match source.read(&mut byte) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "output stream closed before end-of-response marker",
                ))
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        pending.push(byte[0]);

        let Ok(decoded) = std::str::from_utf8(&pending) else {
            if pending.len() > MAX_CHAR_BYTES {
                tracing::trace!(bytes = ?pending, "discarding undecodable bytes");
                pending.clear();
            }
            continue;
        };

        if decoded.starts_with(SENTINEL) {
            return Ok(lines.join("\n"));
        }

        if decoded == "\n" {
            lines.push(String::new());
        } else if let Some(last) = lines.last_mut() {
            last.push_str(decoded);
        }

        if let Some(sink) = echo.as_deref_mut() {
            sink.write_all(decoded.as_bytes())?;
            sink.flush()?;
        }
        pending.clear();
    }
}
