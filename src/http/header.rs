use std::collections::HashMap;

/// Header map with case-insensitive keys.
///
/// Keys are stored upper-cased, and every lookup upper-cases the queried
/// name, so `Content-Type` and `content-type` address the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    inner: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any previous value for the same name.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.inner
            .insert(key.as_ref().trim().to_ascii_uppercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(&key.to_ascii_uppercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(&key.to_ascii_uppercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(&key.to_ascii_uppercase())
    }

    /// Iterates over `(NAME, value)` pairs; names are upper-cased.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// First line of an HTTP message.
#[derive(Debug, Clone, PartialEq)]
pub enum StartLine {
    /// `<METHOD> <path> HTTP/<version>` sent by a client.
    Request { method: String, path: String },
    /// `HTTP/<version> <code> <reason>` sent by a server.
    Status { code: u16, reason: String },
}

/// A parsed HTTP message head.
///
/// Produced by [`HttpHeaderParser`](crate::http::parser::HttpHeaderParser).
/// The connection dispatcher may merge form body values into the URL
/// attributes before a page sees the head; after that it is read-only.
#[derive(Debug, Clone)]
pub struct HttpHeader {
    pub(crate) start: StartLine,
    pub(crate) version: f32,
    pub(crate) url_attributes: HashMap<String, String>,
    pub(crate) headers: HeaderMap,
    pub(crate) cookies: HashMap<String, String>,
}

impl HttpHeader {
    /// Creates an empty HTTP/1.0 request head for `method` and `path`.
    ///
    /// The path goes through the same normalization as a parsed request line.
    pub fn request(method: impl Into<String>, path: &str) -> Self {
        Self::with_start(StartLine::Request {
            method: method.into(),
            path: normalize_path(path),
        })
    }

    pub(crate) fn with_start(start: StartLine) -> Self {
        Self {
            start,
            version: 1.0,
            url_attributes: HashMap::new(),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
        }
    }

    pub fn start_line(&self) -> &StartLine {
        &self.start
    }

    pub fn is_request(&self) -> bool {
        matches!(self.start, StartLine::Request { .. })
    }

    pub fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// Request method, e.g. `GET`. `None` for a response head.
    pub fn method(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Status { .. } => None,
        }
    }

    /// Normalized request path without the query string.
    pub fn path(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { path, .. } => Some(path),
            StartLine::Status { .. } => None,
        }
    }

    /// The request path with its leading `/` removed.
    pub fn request_page(&self) -> Option<&str> {
        self.path().map(|p| p.strip_prefix('/').unwrap_or(p))
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.start {
            StartLine::Status { code, .. } => Some(*code),
            StartLine::Request { .. } => None,
        }
    }

    pub fn version(&self) -> f32 {
        self.version
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_str())
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn url_attribute(&self, name: &str) -> Option<&str> {
        self.url_attributes.get(name).map(|v| v.as_str())
    }

    pub fn url_attributes(&self) -> &HashMap<String, String> {
        &self.url_attributes
    }
}

/// Trims the path, collapses doubled separators and ensures a leading `/`.
pub(crate) fn normalize_path(raw: &str) -> String {
    let mut path = raw.trim().to_string();
    while path.contains("//") {
        path = path.replace("//", "/");
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}
