use std::collections::HashMap;
use std::sync::Arc;

use pageserve::config::Config;
use pageserve::http::header::HttpHeader;
use pageserve::http::page::{BoxFuture, Page, ResponseWriter};
use pageserve::server::{listener, HttpServer};
use pageserve::session::Session;
use tracing_subscriber::EnvFilter;

/// Counts how many times the current session has loaded the page.
struct VisitCounter;

impl Page for VisitCounter {
    fn respond<'a>(
        &'a self,
        out: &'a mut ResponseWriter,
        _request: &'a HttpHeader,
        session: &'a Session,
        _cookies: &'a HashMap<String, String>,
        _url_attributes: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let visits = session.get::<u64>("visits").unwrap_or(0) + 1;
            session.insert("visits", visits);

            out.println("<html><body>").await?;
            out.println(&format!("<p>Session {}: visit {}</p>", session.id(), visits))
                .await?;
            out.println("</body></html>").await?;
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = Config::load()?;

    let mut server = HttpServer::new(cfg);
    server.set_page("/", VisitCounter);
    let server = Arc::new(server);

    tokio::select! {
        res = listener::run(server) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
