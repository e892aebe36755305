/// Whitespace-delimited tokenization over buffered streams
use std::io::{self, BufRead};

/// Splits a stream into whitespace-separated tokens.
///
/// The token buffer is reused between calls and grows on demand.
pub struct TokenReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R: BufRead> TokenReader<R> {
    pub fn new(inner: R) -> Self {
        TokenReader {
            inner,
            buf: Vec::with_capacity(16),
        }
    }

    /// Next token, or `None` once only whitespace is left
    pub fn next_token(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        loop {
            let chunk = match self.inner.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                break;
            }

            let mut consumed = 0;
            let mut complete = false;
            for &byte in chunk {
                consumed += 1;
                if byte.is_ascii_whitespace() {
                    if !self.buf.is_empty() {
                        complete = true;
                        break;
                    }
                } else {
                    self.buf.push(byte);
                }
            }
            self.inner.consume(consumed);
            if complete {
                break;
            }
        }

        if self.buf.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
        }
    }

    /// True if the rest of the stream is whitespace. Consumes what it reads.
    pub fn is_eof(&mut self) -> io::Result<bool> {
        loop {
            let chunk = match self.inner.fill_buf() {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if chunk.is_empty() {
                return Ok(true);
            }
            if chunk.iter().any(|b| !b.is_ascii_whitespace()) {
                return Ok(false);
            }
            let len = chunk.len();
            self.inner.consume(len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn tokens(data: &str) -> Vec<String> {
        let mut reader = TokenReader::new(Cursor::new(data.as_bytes().to_vec()));
        let mut out = Vec::new();
        while let Some(tok) = reader.next_token().unwrap() {
            out.push(tok);
        }
        out
    }

    #[test]
    fn test_splits_on_any_whitespace() {
        assert_eq!(tokens("  1 2\n\t3\r\n  abc  "), vec!["1", "2", "3", "abc"]);
        assert!(tokens("").is_empty());
        assert!(tokens(" \n\t ").is_empty());
    }

    #[test]
    fn test_tokens_span_buffer_refills() {
        // capacity 4 forces tokens to straddle fill_buf boundaries
        let data = "alpha beta\ngammadelta 42";
        let mut reader = TokenReader::new(BufReader::with_capacity(4, Cursor::new(data)));
        let mut out = Vec::new();
        while let Some(tok) = reader.next_token().unwrap() {
            out.push(tok);
        }
        assert_eq!(out, vec!["alpha", "beta", "gammadelta", "42"]);
    }

    #[test]
    fn test_long_token_grows_buffer() {
        let long = "x".repeat(10_000);
        assert_eq!(tokens(&format!("{} y", long)), vec![long, "y".to_string()]);
    }

    #[test]
    fn test_is_eof() {
        let mut reader = TokenReader::new(Cursor::new("42 \n\n"));
        assert!(!reader.is_eof().unwrap());
        assert_eq!(reader.next_token().unwrap().as_deref(), Some("42"));
        assert!(reader.is_eof().unwrap());

        let mut reader = TokenReader::new(Cursor::new("1 2"));
        reader.next_token().unwrap();
        assert!(!reader.is_eof().unwrap());
    }
}
