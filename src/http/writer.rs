use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::status::{reason_phrase, OK};

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("header already sent")]
    HeaderAlreadySent,
    #[error("{0} is only available for {1:?} messages")]
    WrongMessageKind(&'static str, MessageKind),
    #[error("i/o error while writing message: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether the writer produces a server response or a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// Head fields that can still change before the first body byte.
#[derive(Debug)]
struct PendingHead {
    status_code: Option<u16>,
    request_type: String,
    request_url: String,
    protocol_version: String,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

#[derive(Debug)]
enum Head {
    Pending(PendingHead),
    Sent,
}

/// Writes an HTTP/1.0 message with deferred header emission.
///
/// Status, headers and cookies are collected until the first body write,
/// `flush` or `close`. At that point the head block is written exactly once,
/// followed by the body. Setters called after that fail with
/// [`WriterError::HeaderAlreadySent`].
///
/// With buffering enabled, text written through [`print`](Self::print) and
/// [`println`](Self::println) is held back until buffering is disabled or the
/// writer is flushed or closed.
pub struct HttpWriter<W> {
    inner: W,
    kind: MessageKind,
    head: Head,
    sent_status: Option<u16>,
    buffer: String,
    buffering: bool,
}

impl<W: AsyncWrite + Unpin> HttpWriter<W> {
    /// Creates a response writer.
    pub fn new(inner: W) -> Self {
        Self::with_kind(inner, MessageKind::Response)
    }

    /// Creates a writer for the given message kind. Requests default to
    /// `GET /`.
    pub fn with_kind(inner: W, kind: MessageKind) -> Self {
        Self {
            inner,
            kind,
            head: Head::Pending(PendingHead {
                status_code: None,
                request_type: "GET".to_string(),
                request_url: "/".to_string(),
                protocol_version: "1.0".to_string(),
                headers: Vec::new(),
                cookies: Vec::new(),
            }),
            sent_status: None,
            buffer: String::new(),
            buffering: false,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_header_sent(&self) -> bool {
        matches!(self.head, Head::Sent)
    }

    /// The status code that is pending or was emitted. Unset means 200.
    pub fn status_code(&self) -> u16 {
        match &self.head {
            Head::Pending(head) => head.status_code.unwrap_or(OK),
            Head::Sent => self.sent_status.unwrap_or(OK),
        }
    }

    pub fn set_status_code(&mut self, code: u16) -> Result<(), WriterError> {
        self.expect_kind(MessageKind::Response, "status code")?;
        self.pending()?.status_code = Some(code);
        Ok(())
    }

    pub fn set_request_type(&mut self, method: &str) -> Result<(), WriterError> {
        self.expect_kind(MessageKind::Request, "request type")?;
        self.pending()?.request_type = method.to_string();
        Ok(())
    }

    pub fn set_request_url(&mut self, url: &str) -> Result<(), WriterError> {
        self.expect_kind(MessageKind::Request, "request url")?;
        self.pending()?.request_url = url.to_string();
        Ok(())
    }

    pub fn set_protocol_version(&mut self, version: &str) -> Result<(), WriterError> {
        self.pending()?.protocol_version = version.to_string();
        Ok(())
    }

    /// Sets a header, replacing an earlier one with the same name
    /// (compared case-insensitively).
    pub fn set_header(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WriterError> {
        let (key, value) = (key.into(), value.into());
        let headers = &mut self.pending()?.headers;
        match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(entry) => entry.1 = value,
            None => headers.push((key, value)),
        }
        Ok(())
    }

    pub fn set_cookie(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WriterError> {
        let (key, value) = (key.into(), value.into());
        let cookies = &mut self.pending()?.cookies;
        match cookies.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => cookies.push((key, value)),
        }
        Ok(())
    }

    /// Turns text buffering on or off. Turning it off flushes what was
    /// buffered, head first.
    pub async fn enable_buffering(&mut self, enable: bool) -> Result<(), WriterError> {
        self.buffering = enable;
        if !enable {
            self.flush().await?;
        }
        Ok(())
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    pub async fn print(&mut self, text: &str) -> Result<(), WriterError> {
        if self.buffering {
            self.buffer.push_str(text);
            Ok(())
        } else {
            self.write_through(text.as_bytes()).await
        }
    }

    pub async fn println(&mut self, text: &str) -> Result<(), WriterError> {
        self.print(text).await?;
        self.print("\n").await
    }

    /// Writes raw bytes, bypassing the text buffer. Buffered text is sent
    /// first so ordering is kept.
    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriterError> {
        self.flush_buffer().await?;
        self.write_through(data).await
    }

    /// Sends the head if still pending, drains the text buffer and flushes
    /// the transport.
    pub async fn flush(&mut self) -> Result<(), WriterError> {
        self.flush_buffer().await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Flushes everything and shuts down the write side of the transport.
    pub async fn close(&mut self) -> Result<(), WriterError> {
        self.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    async fn flush_buffer(&mut self) -> Result<(), WriterError> {
        if self.buffer.is_empty() && self.is_header_sent() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.buffer);
        self.write_through(text.as_bytes()).await
    }

    /// Writes `body` to the transport, preceded by the head block if it has
    /// not been emitted yet.
    /// On a failed write the head stays pending.
    async fn write_through(&mut self, body: &[u8]) -> Result<(), WriterError> {
        let pending = match std::mem::replace(&mut self.head, Head::Sent) {
            Head::Pending(head) => Some(head),
            Head::Sent => None,
        };

        let mut out = BytesMut::new();
        if let Some(head) = &pending {
            head.encode(self.kind, &mut out);
        }
        out.extend_from_slice(body);

        if !out.is_empty() {
            if let Err(e) = self.inner.write_all(&out).await {
                if let Some(head) = pending {
                    self.head = Head::Pending(head);
                }
                return Err(e.into());
            }
        }
        if let Some(head) = pending {
            self.sent_status = head.status_code;
        }
        Ok(())
    }

    fn pending(&mut self) -> Result<&mut PendingHead, WriterError> {
        match &mut self.head {
            Head::Pending(head) => Ok(head),
            Head::Sent => Err(WriterError::HeaderAlreadySent),
        }
    }

    fn expect_kind(&self, kind: MessageKind, what: &'static str) -> Result<(), WriterError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(WriterError::WrongMessageKind(what, kind))
        }
    }
}

impl PendingHead {
    fn encode(&self, kind: MessageKind, out: &mut BytesMut) {
        let start_line = match kind {
            MessageKind::Request => format!(
                "{} {} HTTP/{}",
                self.request_type, self.request_url, self.protocol_version
            ),
            MessageKind::Response => {
                let code = self.status_code.unwrap_or(OK);
                format!(
                    "HTTP/{} {} {}",
                    self.protocol_version,
                    code,
                    reason_phrase(code)
                )
            }
        };
        put_line(out, &start_line);

        for (key, value) in &self.headers {
            put_line(out, &format!("{key}: {value}"));
        }

        if !self.cookies.is_empty() {
            match kind {
                MessageKind::Request => {
                    let pairs: String = self
                        .cookies
                        .iter()
                        .map(|(k, v)| format!("{k}={v}; "))
                        .collect();
                    put_line(out, &format!("Cookie: {pairs}"));
                }
                MessageKind::Response => {
                    for (key, value) in &self.cookies {
                        put_line(out, &format!("Set-Cookie: {key}={value};"));
                    }
                }
            }
        }

        out.extend_from_slice(CRLF);
    }
}

fn put_line(out: &mut BytesMut, line: &str) {
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(CRLF);
}
