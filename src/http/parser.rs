use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::header::{normalize_path, HttpHeader, StartLine};

/// Marker that separates the protocol name from its version.
const VERSION_MARKER: &str = "HTTP/";

/// Longest head line accepted, excluding the line terminator.
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed start line: {0:?}")]
    MalformedStartLine(String),
    #[error("invalid protocol version: {0:?}")]
    InvalidVersion(String),
    #[error("invalid status code in: {0:?}")]
    InvalidStatusCode(String),
    #[error("head line exceeds {MAX_LINE_LENGTH} bytes")]
    LineTooLong,
    #[error("i/o error while reading head: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads an HTTP message head line by line from a buffered stream.
///
/// The parser only consumes the head; whatever follows the blank line
/// (the body) stays unread in the underlying reader.
pub struct HttpHeaderParser<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> HttpHeaderParser<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parses one message head.
    ///
    /// Returns `Ok(None)` when the stream is closed or the first line is
    /// empty. If the stream ends before the blank line that terminates the
    /// head, the headers collected so far are returned as a complete head.
    pub async fn read(&mut self) -> Result<Option<HttpHeader>, ParseError> {
        let first = match self.read_line().await? {
            Some(line) if !line.is_empty() => line,
            _ => return Ok(None),
        };
        let mut header = parse_start_line(&first)?;

        while let Some(line) = self.read_line().await? {
            if line.is_empty() {
                break;
            }
            parse_header_line(&mut header, &line);
        }

        if let Some(cookie) = header.headers.get("Cookie") {
            let cookie = cookie.to_string();
            parse_header_values(&mut header.cookies, &cookie, ';');
        }

        Ok(Some(header))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    async fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(MAX_LINE_LENGTH as u64 + 2)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > MAX_LINE_LENGTH {
            return Err(ParseError::LineTooLong);
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

fn parse_start_line(line: &str) -> Result<HttpHeader, ParseError> {
    // Status line: HTTP/1.0 200 OK
    if let Some(rest) = line.strip_prefix(VERSION_MARKER) {
        let mut parts = rest.splitn(3, ' ');
        let version = parse_version(parts.next().unwrap_or_default())?;
        let code = parts
            .next()
            .map(str::trim)
            .filter(|c| c.len() == 3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| ParseError::InvalidStatusCode(line.to_string()))?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let mut header = HttpHeader::with_start(StartLine::Status { code, reason });
        header.version = version;
        return Ok(header);
    }

    // Request line: GET /path?query HTTP/1.0
    let marker = line
        .find(&format!(" {VERSION_MARKER}"))
        .ok_or_else(|| ParseError::MalformedStartLine(line.to_string()))?;
    let before = &line[..marker];
    let version_token = line[marker + 1 + VERSION_MARKER.len()..]
        .split_whitespace()
        .next()
        .unwrap_or_default();

    let (method, target) = before.split_once(' ').unwrap_or((before, ""));
    let method = method.trim();
    if method.is_empty() {
        return Err(ParseError::MalformedStartLine(line.to_string()));
    }
    let version = parse_version(version_token)?;

    let mut url_attributes = HashMap::new();
    let path = match target.trim().split_once('?') {
        Some((path, query)) => {
            parse_url_parameters(&mut url_attributes, query);
            path
        }
        None => target.trim(),
    };

    let mut header = HttpHeader::with_start(StartLine::Request {
        method: method.to_string(),
        path: normalize_path(path),
    });
    header.version = version;
    header.url_attributes = url_attributes;
    Ok(header)
}

fn parse_version(token: &str) -> Result<f32, ParseError> {
    token
        .trim()
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidVersion(token.to_string()))
}

/// Stores one `Name: value` line. A line without a colon gets an empty value.
fn parse_header_line(header: &mut HttpHeader, line: &str) {
    let (key, value) = line.split_once(':').unwrap_or((line, ""));
    header.headers.insert(key.trim(), value.trim());
}

/// Decodes `k=v&k2=v2` (form-urlencoded) into `map`.
///
/// Keys and values are trimmed, a pair without `=` gets an empty value, and
/// a repeated key keeps its last value.
pub fn parse_url_parameters(map: &mut HashMap<String, String>, query: &str) {
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
}

/// Splits a `k=v<delimiter>k2=v2` header value into `map`.
///
/// Surrounding double quotes are stripped from values.
pub fn parse_header_values(map: &mut HashMap<String, String>, value: &str, delimiter: char) {
    for segment in value.split(delimiter) {
        if segment.trim().is_empty() {
            continue;
        }
        let (key, val) = segment.split_once('=').unwrap_or((segment, ""));
        map.insert(
            key.trim().to_string(),
            val.trim().trim_matches('"').to_string(),
        );
    }
}
