use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pageserve::client::{HttpClient, RequestType};
use pageserve::config::{Config, ConfigError};
use pageserve::http::header::HttpHeader;
use pageserve::http::page::{BoxFuture, Page, ResponseWriter};
use pageserve::server::{listener, HttpServer};
use pageserve::session::Session;
use tokio::net::TcpListener;

/// Echoes method, session id and sorted attributes.
struct Echo;

impl Page for Echo {
    fn respond<'a>(
        &'a self,
        out: &'a mut ResponseWriter,
        request: &'a HttpHeader,
        session: &'a Session,
        _cookies: &'a HashMap<String, String>,
        url_attributes: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            out.set_header("Content-Type", "text/plain")?;
            out.println(&format!(
                "{} session={}",
                request.method().unwrap_or_default(),
                session.id()
            ))
            .await?;
            let mut keys: Vec<_> = url_attributes.keys().collect();
            keys.sort();
            for key in keys {
                out.println(&format!("{}={}", key, url_attributes[key])).await?;
            }
            Ok(())
        })
    }
}

async fn start_server() -> SocketAddr {
    let mut server = HttpServer::new(Config::default());
    server.set_page("/echo", Echo);
    let server = Arc::new(server);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener::serve(listener, server));
    addr
}

#[tokio::test]
async fn test_client_get_with_parameters() {
    let addr = start_server().await;

    let mut client = HttpClient::new(RequestType::Get, &format!("http://{addr}/echo")).unwrap();
    client.set_parameter("q", "hello world");
    client.set_parameter("page", "2");
    let response = client.send().await.unwrap();

    assert_eq!(response.status_code(), Some(200));
    assert_eq!(response.header.header("content-type"), Some("text/plain"));
    assert_eq!(response.body_text(), "GET session=0\npage=2\nq=hello world\n");
    assert_eq!(response.header.cookie("session_id"), None);
}

#[tokio::test]
async fn test_client_post_sends_parameters_as_form() {
    let addr = start_server().await;

    let mut client = HttpClient::new(RequestType::Post, &format!("http://{addr}/echo")).unwrap();
    client.set_parameter("name", "bob");
    client.set_parameter("city", "new york");
    let response = client.send().await.unwrap();

    assert_eq!(response.status_code(), Some(200));
    assert_eq!(response.body_text(), "POST session=0\ncity=new york\nname=bob\n");
}

#[tokio::test]
async fn test_client_session_cookie_roundtrip() {
    let addr = start_server().await;
    let url = format!("http://{addr}/echo");

    let first = HttpClient::new(RequestType::Get, &url).unwrap().send().await.unwrap();
    let set_cookie = first.header.header("Set-Cookie").unwrap();
    assert_eq!(set_cookie, "session_id=0;");

    let mut client = HttpClient::new(RequestType::Get, &url).unwrap();
    client.set_cookie("session_id", "0");
    let second = client.send().await.unwrap();
    assert!(second.body_text().starts_with("GET session=0\n"));

    let stranger = HttpClient::new(RequestType::Get, &url).unwrap().send().await.unwrap();
    assert!(stranger.body_text().starts_with("GET session=1\n"));
}

#[tokio::test]
async fn test_client_missing_page_is_404() {
    let addr = start_server().await;

    let response = HttpClient::new(RequestType::Get, &format!("http://{addr}/nope"))
        .unwrap()
        .send()
        .await
        .unwrap();

    assert_eq!(response.status_code(), Some(404));
    assert_eq!(response.body_text(), "404 Page Not Found: /nope\n");
}

#[test]
fn test_client_rejects_non_http_urls() {
    assert!(HttpClient::new(RequestType::Get, "https://example.com/").is_err());
    assert!(HttpClient::new(RequestType::Get, "not a url").is_err());
}

#[tokio::test]
async fn test_client_with_custom_connect_timeout() {
    let addr = start_server().await;

    let mut client = HttpClient::new(RequestType::Get, &format!("http://{addr}/echo")).unwrap();
    client.set_connect_timeout(Duration::from_secs(1));
    let response = client.send().await.unwrap();

    assert_eq!(response.status_code(), Some(200));
}

#[tokio::test]
async fn test_serve_rejects_zero_ttl() {
    let mut config = Config::default();
    config.session.ttl_ms = 0;
    let server = Arc::new(HttpServer::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), listener::serve(listener, server))
        .await
        .expect("serve should fail before accepting");

    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<ConfigError>(),
        Some(ConfigError::Zero("session.ttl_ms"))
    ));
}
