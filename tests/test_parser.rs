use pageserve::http::header::StartLine;
use pageserve::http::parser::{ParseError, HttpHeaderParser};

async fn parse(input: &str) -> Result<Option<pageserve::http::header::HttpHeader>, ParseError> {
    HttpHeaderParser::new(input.as_bytes()).read().await
}

#[tokio::test]
async fn test_parse_get_with_query_string() {
    let header = parse("GET /index.html?key=value HTTP/1.0\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert!(header.is_request());
    assert_eq!(header.method(), Some("GET"));
    assert_eq!(header.path(), Some("/index.html"));
    assert_eq!(header.url_attribute("key"), Some("value"));
    assert_eq!(header.version(), 1.0);
    assert_eq!(header.header("Host"), Some("example.com"));
}

#[tokio::test]
async fn test_parse_multiple_url_attributes() {
    let header = parse("GET /search?q=rust&page=2&flag HTTP/1.1\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.url_attributes().len(), 3);
    assert_eq!(header.url_attribute("q"), Some("rust"));
    assert_eq!(header.url_attribute("page"), Some("2"));
    // Missing "=value" yields an empty value
    assert_eq!(header.url_attribute("flag"), Some(""));
    assert_eq!(header.version(), 1.1);
}

#[tokio::test]
async fn test_parse_url_attributes_are_decoded_and_trimmed() {
    let header = parse("GET /form?name=hello+world&sym=%41%26B&k=1&k=2&%20pad%20=%20x%20 HTTP/1.0\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.url_attribute("name"), Some("hello world"));
    assert_eq!(header.url_attribute("sym"), Some("A&B"));
    // Last value wins
    assert_eq!(header.url_attribute("k"), Some("2"));
    assert_eq!(header.url_attribute("pad"), Some("x"));
}

#[tokio::test]
async fn test_parse_path_normalization() {
    let header = parse("GET //a//b///c HTTP/1.0\r\n\r\n").await.unwrap().unwrap();
    assert_eq!(header.path(), Some("/a/b/c"));
    assert_eq!(header.request_page(), Some("a/b/c"));

    let header = parse("GET page HTTP/1.0\r\n\r\n").await.unwrap().unwrap();
    assert_eq!(header.path(), Some("/page"));
}

#[tokio::test]
async fn test_parse_header_lookup_case_insensitive() {
    let header = parse("POST /api HTTP/1.0\r\nContent-Type: text/html\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.header("content-type"), Some("text/html"));
    assert_eq!(header.header("CONTENT-TYPE"), Some("text/html"));
    assert_eq!(header.header("Content-Type"), Some("text/html"));
    assert!(header.headers().contains("cOnTeNt-TyPe"));
}

#[tokio::test]
async fn test_parse_duplicate_header_last_wins() {
    let header = parse("GET / HTTP/1.0\r\nX-Test: first\r\nx-test: second\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.header("X-Test"), Some("second"));
    assert_eq!(header.headers().len(), 1);
}

#[tokio::test]
async fn test_parse_header_without_colon() {
    let header = parse("GET / HTTP/1.0\r\nBrokenHeader\r\nHost:  spaced.example  \r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.header("BrokenHeader"), Some(""));
    assert_eq!(header.header("Host"), Some("spaced.example"));
}

#[tokio::test]
async fn test_parse_header_value_with_colon() {
    let header = parse("GET / HTTP/1.0\r\nHost: localhost:8080\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.header("host"), Some("localhost:8080"));
}

#[tokio::test]
async fn test_parse_cookies() {
    let header = parse("GET / HTTP/1.0\r\nCookie: a=1; b=2\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.cookies().len(), 2);
    assert_eq!(header.cookie("a"), Some("1"));
    assert_eq!(header.cookie("b"), Some("2"));
}

#[tokio::test]
async fn test_parse_cookie_edge_cases() {
    let header = parse("GET / HTTP/1.0\r\ncookie: session_id=7; quoted=\"v\"; bare; \r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.cookie("session_id"), Some("7"));
    assert_eq!(header.cookie("quoted"), Some("v"));
    assert_eq!(header.cookie("bare"), Some(""));
    assert_eq!(header.cookies().len(), 3);
}

#[tokio::test]
async fn test_parse_lf_only_line_endings() {
    let header = parse("GET /lf HTTP/1.0\nHost: example.com\n\n")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.path(), Some("/lf"));
    assert_eq!(header.header("Host"), Some("example.com"));
}

#[tokio::test]
async fn test_parse_status_line() {
    let header = parse("HTTP/1.0 404 Not Found\r\nContent-Length: 0\r\n\r\n")
        .await
        .unwrap()
        .unwrap();

    assert!(header.is_response());
    assert_eq!(header.status_code(), Some(404));
    assert_eq!(header.method(), None);
    assert_eq!(header.path(), None);
    assert_eq!(
        header.start_line(),
        &StartLine::Status {
            code: 404,
            reason: "Not Found".to_string()
        }
    );
}

#[tokio::test]
async fn test_parse_empty_input_yields_none() {
    assert!(parse("").await.unwrap().is_none());
    assert!(parse("\r\nGET / HTTP/1.0\r\n\r\n").await.unwrap().is_none());
}

#[tokio::test]
async fn test_parse_truncated_head_is_returned() {
    // No blank line: the stream ended mid-head
    let header = parse("GET /partial HTTP/1.0\r\nHost: example.com\r\nX-Half: ye")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(header.path(), Some("/partial"));
    assert_eq!(header.header("Host"), Some("example.com"));
    assert_eq!(header.header("X-Half"), Some("ye"));
}

#[tokio::test]
async fn test_parse_malformed_start_line() {
    let result = parse("NONSENSE\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::MalformedStartLine(_))));

    let result = parse(" /x HTTP/1.0\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::MalformedStartLine(_))));
}

#[tokio::test]
async fn test_parse_invalid_version_and_status() {
    let result = parse("GET / HTTP/x.y\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidVersion(_))));

    let result = parse("HTTP/1.0 abc Nope\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidStatusCode(_))));
}

#[tokio::test]
async fn test_parse_line_too_long() {
    let request = format!("GET /{} HTTP/1.0\r\n\r\n", "a".repeat(9000));
    let result = parse(&request).await;

    assert!(matches!(result, Err(ParseError::LineTooLong)));
}

#[tokio::test]
async fn test_parse_leaves_body_unread() {
    let mut input: &[u8] = b"POST /api HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
    let header = HttpHeaderParser::new(&mut input).read().await.unwrap().unwrap();

    assert_eq!(header.header("Content-Length"), Some("5"));
    assert_eq!(input, b"hello");
}
