//! HTTP status codes used by the server and their reason phrases.

pub const CONTINUE: u16 = 100;
pub const OK: u16 = 200;
pub const MOVED_PERMANENTLY: u16 = 301;
pub const NOT_MODIFIED: u16 = 304;
pub const TEMPORARY_REDIRECT: u16 = 307;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const NOT_IMPLEMENTED: u16 = 501;

/// Returns the standard reason phrase for `code`.
///
/// Codes outside the table map to an empty phrase.
///
/// # Example
///
/// ```
/// # use pageserve::http::status::reason_phrase;
/// assert_eq!(reason_phrase(200), "OK");
/// assert_eq!(reason_phrase(404), "Not Found");
/// assert_eq!(reason_phrase(299), "");
/// ```
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        CONTINUE => "Continue",
        OK => "OK",
        MOVED_PERMANENTLY => "Moved Permanently",
        NOT_MODIFIED => "Not Modified",
        TEMPORARY_REDIRECT => "Temporary Redirect",
        BAD_REQUEST => "Bad Request",
        UNAUTHORIZED => "Unauthorized",
        FORBIDDEN => "Forbidden",
        NOT_FOUND => "Not Found",
        INTERNAL_SERVER_ERROR => "Internal Server Error",
        NOT_IMPLEMENTED => "Not Implemented",
        _ => "",
    }
}
