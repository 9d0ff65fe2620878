use crate::http::request::{Method, Request, RequestBuilder};
use std::fmt;

/// Largest request, head and declared body together, a connection will buffer.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// More bytes are needed before a decision can be made.
    Incomplete,
    /// Nothing was received, the bytes are not text, or the version is not HTTP/*.
    NotHttp,
    MalformedRequestLine,
    MalformedHeader,
    InvalidContentLength,
    /// The request would exceed `MAX_REQUEST_BYTES`.
    TooLarge,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::Incomplete => "request is incomplete",
            ParseError::NotHttp => "only HTTP requests are accepted",
            ParseError::MalformedRequestLine => "malformed request line",
            ParseError::MalformedHeader => "malformed header line",
            ParseError::InvalidContentLength => "invalid Content-Length",
            ParseError::TooLarge => "request too large",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// Parses a request from the bytes received so far.
///
/// Returns the request and the number of bytes it consumed, or
/// `ParseError::Incomplete` if the caller should read more and retry.
///
/// Without a Content-Length header the body is whatever already follows the
/// blank line in `buf`; bytes arriving later are not part of the request.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    parse(buf, false)
}

/// Parses a request from a stream the peer has already closed.
///
/// An unterminated last line is taken as-is, and a header block cut short by
/// the end of the stream is accepted with the headers read so far.
pub fn parse_http_request_eof(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    parse(buf, true)
}

fn parse(buf: &[u8], eof: bool) -> Result<(Request, usize), ParseError> {
    let mut cursor = 0;

    // Request line
    let request_line = match next_line(buf, &mut cursor, eof) {
        Some(line) => line,
        None if eof => return Err(ParseError::NotHttp),
        None => return Err(ParseError::Incomplete),
    };
    let request_line = std::str::from_utf8(request_line).map_err(|_| ParseError::NotHttp)?;

    let parts: Vec<&str> = request_line.splitn(3, ' ').collect();
    let [method, path, version] = parts[..] else {
        return Err(ParseError::MalformedRequestLine);
    };
    if !version.starts_with("HTTP/") {
        return Err(ParseError::NotHttp);
    }

    let mut builder = RequestBuilder::new()
        .method(Method::parse(method))
        .path(path)
        .version(version);

    // Headers
    loop {
        let line = match next_line(buf, &mut cursor, eof) {
            Some(line) => line,
            None if eof => break,
            None => return Err(ParseError::Incomplete),
        };
        if line.is_empty() {
            break;
        }

        let line = std::str::from_utf8(line).map_err(|_| ParseError::NotHttp)?;
        let (key, value) = line.split_once(": ").ok_or(ParseError::MalformedHeader)?;

        builder = builder.header(key, value);
    }

    // Empty method or path
    let mut request = builder
        .build()
        .map_err(|_| ParseError::MalformedRequestLine)?;

    // Body
    let rest = &buf[cursor..];
    let (body_bytes, consumed) = match (request.header("Content-Length"), request.content_length()) {
        (None, _) => (rest, buf.len()),
        (Some(_), None) => return Err(ParseError::InvalidContentLength),
        (Some(_), Some(len)) => {
            if len > MAX_REQUEST_BYTES.saturating_sub(cursor) {
                return Err(ParseError::TooLarge);
            }
            if rest.len() < len {
                return Err(ParseError::Incomplete);
            }
            (&rest[..len], cursor + len)
        }
    };

    request.body = String::from_utf8_lossy(body_bytes)
        .lines()
        .map(str::to_string)
        .collect();

    Ok((request, consumed))
}

/// Returns the next line starting at `cursor`, without its terminator.
///
/// A line ends at `\n`, `\r\n`, or a lone `\r`.
fn next_line<'a>(buf: &'a [u8], cursor: &mut usize, eof: bool) -> Option<&'a [u8]> {
    let rest = &buf[*cursor..];

    match rest.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(end) => {
            let terminator = match (rest[end], rest.get(end + 1)) {
                (b'\r', Some(b'\n')) => 2,
                // A trailing \r may still be followed by \n, unless it ends
                // the header block
                (b'\r', None) if !eof && end > 0 => return None,
                _ => 1,
            };
            *cursor += end + terminator;
            Some(&rest[..end])
        }
        None if eof && !rest.is_empty() => {
            *cursor = buf.len();
            Some(rest)
        }
        None => None,
    }
}
