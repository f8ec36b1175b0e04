use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::io::AsyncWrite;

use crate::http::header::HttpHeader;
use crate::http::writer::HttpWriter;
use crate::session::Session;

/// A pinned, sendable future borrowing from its caller.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased write half of a client connection.
pub type ResponseStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Response writer handed to pages.
pub type ResponseWriter = HttpWriter<ResponseStream>;

/// A request handler registered under a path.
///
/// `respond` receives the response writer with status 200, `Server`,
/// `Content-Type: text/html` and the session cookie already set, so a page
/// may still change any of them before writing its body. Returning an error
/// turns the response into a 500.
///
/// # Example
///
/// ```ignore
/// struct Hello;
///
/// impl Page for Hello {
///     fn respond<'a>(
///         &'a self,
///         out: &'a mut ResponseWriter,
///         _request: &'a HttpHeader,
///         _session: &'a Session,
///         _cookies: &'a HashMap<String, String>,
///         _url_attributes: &'a HashMap<String, String>,
///     ) -> BoxFuture<'a, anyhow::Result<()>> {
///         Box::pin(async move {
///             out.println("Hello").await?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Page: Send + Sync {
    fn respond<'a>(
        &'a self,
        out: &'a mut ResponseWriter,
        request: &'a HttpHeader,
        session: &'a Session,
        cookies: &'a HashMap<String, String>,
        url_attributes: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}
