use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, trace, warn};

use crate::http::header::HttpHeader;
use crate::http::page::ResponseWriter;
use crate::http::parser::{parse_url_parameters, HttpHeaderParser, ParseError};
use crate::http::status;
use crate::http::writer::HttpWriter;
use crate::server::HttpServer;
use crate::session::SESSION_KEY_ID;

/// Request-scoped failures raised before a page runs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("\"multipart/form-data\" is not implemented")]
    MultipartUnsupported,
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("request body of {length} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { length: usize, limit: usize },
    #[error("failed to read request body: {0}")]
    Io(#[from] std::io::Error),
}

/// Handles exactly one request on an accepted connection.
///
/// ```text
/// parse head ─► read body ─► resolve session ─► set defaults ─► page
///                                                     │
///                  any error ─► 500 (if head not sent) + message line
///                                                     │
///                                               close stream
/// ```
pub struct Connection<S> {
    stream: S,
    server: Arc<HttpServer>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, server: Arc<HttpServer>) -> Self {
        Self { stream, server }
    }

    /// Serves the request and closes the stream.
    ///
    /// Request failures become HTTP responses; only an error while closing
    /// the stream is reported, and only through the log.
    pub async fn run(self) -> anyhow::Result<()> {
        let started = Instant::now();
        let (read_half, write_half) = tokio::io::split(self.stream);
        let mut reader = BufReader::new(read_half);
        let mut out: ResponseWriter = HttpWriter::new(Box::new(write_half));

        let parsed = HttpHeaderParser::new(&mut reader).read().await;
        let mut header = match parsed {
            Ok(Some(header)) if header.is_request() => header,
            Ok(Some(_)) => {
                reject(&mut out, "expected a request line").await;
                close(out).await;
                return Ok(());
            }
            Ok(None) => {
                trace!("No header received");
                let mut stream = out.into_inner();
                if let Err(e) = stream.shutdown().await {
                    warn!(error = %e, "Could not close connection");
                }
                return Ok(());
            }
            Err(ParseError::Io(e)) => {
                debug!(error = %e, "Connection failed while reading head");
                return Ok(());
            }
            Err(e) => {
                reject(&mut out, &e.to_string()).await;
                close(out).await;
                return Ok(());
            }
        };

        let result = dispatch(&self.server, &mut reader, &mut out, &mut header).await;
        let path = header.path().unwrap_or_default().to_string();

        if let Err(error) = result {
            warn!(path = %path, error = ?error, "500 Internal Server Error");
            fail(&mut out, &error).await;
        }

        let status = out.status_code();
        close(out).await;

        debug!(
            method = header.method().unwrap_or_default(),
            path = %path,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request handled"
        );
        Ok(())
    }
}

async fn dispatch<R>(
    server: &HttpServer,
    reader: &mut R,
    out: &mut ResponseWriter,
    header: &mut HttpHeader,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    read_body(reader, header, server.config().server.max_body_bytes).await?;
    let header: &HttpHeader = header;

    let resolved = server.sessions().resolve(header.cookie(SESSION_KEY_ID));
    let session = resolved.session;

    out.set_status_code(status::OK)?;
    out.set_header("Server", server.server_name())?;
    out.set_header("Content-Type", "text/html")?;
    out.set_cookie(SESSION_KEY_ID, session.id().to_string())?;

    let path = header.path().unwrap_or("/");
    match server.page(path) {
        Some(page) => {
            page.respond(
                out,
                header,
                &session,
                header.cookies(),
                header.url_attributes(),
            )
            .await?;
            trace!(
                path,
                session = session.id(),
                new_session = resolved.created,
                attributes = ?header.url_attributes(),
                "Page responded"
            );
        }
        None => {
            warn!(path, "Page not defined");
            out.set_status_code(status::NOT_FOUND)?;
            out.println(&format!("404 Page Not Found: {path}")).await?;
        }
    }

    Ok(())
}

/// Reads a `Content-Length` body and merges it into the URL attributes
/// according to its content type.
async fn read_body<R>(
    reader: &mut R,
    header: &mut HttpHeader,
    limit: usize,
) -> Result<(), DispatchError>
where
    R: AsyncRead + Unpin,
{
    let content_type = header
        .header("Content-Type")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if content_type.contains("multipart/form-data") {
        return Err(DispatchError::MultipartUnsupported);
    }

    let Some(length) = header.header("Content-Length") else {
        return Ok(());
    };
    let length: usize = length
        .trim()
        .parse()
        .map_err(|_| DispatchError::InvalidContentLength(length.to_string()))?;
    if length > limit {
        return Err(DispatchError::BodyTooLarge { length, limit });
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    let text = String::from_utf8_lossy(&body);

    if content_type.contains("application/x-www-form-urlencoded") {
        parse_url_parameters(&mut header.url_attributes, &text);
    } else if content_type.contains("text/xml")
        || content_type.contains("application/soap+xml")
        || content_type.contains("text/plain")
    {
        header.url_attributes.insert(String::new(), text.into_owned());
    } else {
        trace!(length, content_type = %content_type, "Request body ignored");
    }

    Ok(())
}

async fn reject(out: &mut ResponseWriter, reason: &str) {
    warn!(reason, "400 Bad Request");
    let result = async {
        out.set_status_code(status::BAD_REQUEST)?;
        out.println(&format!("400 Bad Request: {reason}")).await
    };
    if let Err(e) = result.await {
        warn!(error = %e, "Could not send 400 response");
    }
}

async fn fail(out: &mut ResponseWriter, error: &anyhow::Error) {
    if !out.is_header_sent() {
        if let Err(e) = out.set_status_code(status::INTERNAL_SERVER_ERROR) {
            warn!(error = %e, "Could not set 500 status");
        }
    }
    let line = format!("500 Internal Server Error: {}", error_message(error));
    if let Err(e) = out.println(&line).await {
        warn!(error = %e, "Could not send 500 response");
    }
}

async fn close(mut out: ResponseWriter) {
    if let Err(e) = out.close().await {
        warn!(error = %e, "Could not close connection");
    }
}

/// The error's own message, else its cause's, else its debug form.
fn error_message(error: &anyhow::Error) -> String {
    let message = error.to_string();
    if !message.is_empty() {
        return message;
    }
    match error.chain().nth(1) {
        Some(cause) => cause.to_string(),
        None => format!("{error:?}"),
    }
}
