//! Minimal HTTP/1.0 client
//!
//! Sends one request per connection with [`HttpWriter`] in request mode and
//! parses the reply with [`HttpHeaderParser`].

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::http::header::HttpHeader;
use crate::http::parser::HttpHeaderParser;
use crate::http::writer::{HttpWriter, MessageKind};

/// Default connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Get,
    Post,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Get => "GET",
            RequestType::Post => "POST",
        }
    }
}

/// A parsed response: status head plus body bytes.
#[derive(Debug)]
pub struct ClientResponse {
    pub header: HttpHeader,
    pub body: Vec<u8>,
}

impl ClientResponse {
    pub fn status_code(&self) -> Option<u16> {
        self.header.status_code()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct HttpClient {
    request_type: RequestType,
    url: Url,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    data: Option<String>,
    connect_timeout: Duration,
}

impl HttpClient {
    pub fn new(request_type: RequestType, url: &str) -> Result<Self> {
        let url = Url::parse(url).context("Invalid request URL")?;
        if url.scheme() != "http" {
            anyhow::bail!("Unsupported URL scheme: {}", url.scheme());
        }
        Ok(Self {
            request_type,
            url,
            headers: Vec::new(),
            cookies: Vec::new(),
            data: None,
            connect_timeout: CONNECT_TIMEOUT,
        })
    }

    /// Appends a query parameter. For POST requests without explicit data
    /// the parameters are sent form-encoded in the body instead.
    pub fn set_parameter(&mut self, key: &str, value: &str) {
        self.url.query_pairs_mut().append_pair(key, value);
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.push((key.into(), value.into()));
    }

    pub fn set_cookie(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.cookies.push((key.into(), value.into()));
    }

    /// Raw POST body.
    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = Some(data.into());
    }

    pub fn set_connect_timeout(&mut self, connect_timeout: Duration) {
        self.connect_timeout = connect_timeout;
    }

    /// Connects to the URL's host and performs the request.
    pub async fn send(&self) -> Result<ClientResponse> {
        let host = self.url.host_str().context("URL missing host")?;
        let port = self.url.port_or_known_default().unwrap_or(80);

        let stream = timeout(self.connect_timeout, TcpStream::connect((host, port)))
            .await
            .context("Connection timeout")?
            .context("Failed to connect")?;
        tracing::trace!(host, port, "Connected");

        self.exchange(stream).await
    }

    /// Writes the request to `stream` and reads the response from it.
    pub async fn exchange<S>(&self, stream: S) -> Result<ClientResponse>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, write_half) = tokio::io::split(stream);

        let mut out = HttpWriter::with_kind(write_half, MessageKind::Request);
        out.set_request_type(self.request_type.as_str())?;
        out.set_request_url(&self.request_target())?;
        if let Some(host) = self.url.host_str() {
            let host = match self.url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            out.set_header("Host", host)?;
        }
        for (key, value) in &self.headers {
            out.set_header(key.as_str(), value.as_str())?;
        }
        for (key, value) in &self.cookies {
            out.set_cookie(key.as_str(), value.as_str())?;
        }

        match self.request_type {
            RequestType::Post => {
                let body = match &self.data {
                    Some(data) => data.clone(),
                    None => {
                        if !self.has_header("Content-Type") {
                            out.set_header("Content-Type", "application/x-www-form-urlencoded")?;
                        }
                        self.url.query().unwrap_or_default().to_string()
                    }
                };
                out.set_header("Content-Length", body.len().to_string())?;
                out.print(&body).await?;
            }
            RequestType::Get => {}
        }
        out.close().await?;

        let mut reader = BufReader::new(read_half);
        let header = HttpHeaderParser::new(&mut reader)
            .read()
            .await?
            .context("Connection closed before a response was received")?;
        if !header.is_response() {
            anyhow::bail!("Expected a status line in the response");
        }

        let body = read_response_body(&mut reader, &header).await?;
        Ok(ClientResponse { header, body })
    }

    /// Path plus query for GET; the bare path for POST.
    fn request_target(&self) -> String {
        let path = match self.url.path() {
            "" => "/",
            path => path,
        };
        match (self.request_type, self.url.query()) {
            (RequestType::Get, Some(query)) => format!("{path}?{query}"),
            _ => path.to_string(),
        }
    }

    fn has_header(&self, key: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

/// Reads the body by `Content-Length`, or until the server closes.
async fn read_response_body<R>(reader: &mut R, header: &HttpHeader) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    match header.header("Content-Length") {
        Some(length) => {
            let length: usize = length.trim().parse().context("Invalid Content-Length")?;
            let mut body = vec![0u8; length];
            reader
                .read_exact(&mut body)
                .await
                .context("Connection closed before complete body received")?;
            Ok(body)
        }
        None => {
            let mut body = Vec::new();
            reader.read_to_end(&mut body).await?;
            Ok(body)
        }
    }
}
