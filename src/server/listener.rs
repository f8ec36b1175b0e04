use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::http::connection::Connection;
use crate::server::HttpServer;

/// Binds the configured address and serves connections until accept fails.
pub async fn run(server: Arc<HttpServer>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&server.config().server.listen_addr).await?;
    serve(listener, server).await
}

/// Serves connections from an already bound listener.
///
/// Fails with [`ConfigError`](crate::config::ConfigError) when the config
/// is invalid. Starts the session sweeper for the lifetime of the accept loop and spawns
/// one task per accepted connection.
pub async fn serve(listener: TcpListener, server: Arc<HttpServer>) -> anyhow::Result<()> {
    server.config().validate()?;
    let sweep_interval = server.config().session.sweep_interval();
    let sweeper = server.sessions().spawn_sweeper(sweep_interval);
    info!(
        addr = %listener.local_addr()?,
        server = server.server_name(),
        "HTTP server ready"
    );

    let result = accept_loop(&listener, &server).await;
    sweeper.abort();
    result
}

async fn accept_loop(listener: &TcpListener, server: &Arc<HttpServer>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::trace!("Accepted connection from {}", peer);

        let conn = Connection::new(socket, Arc::clone(server));
        tokio::spawn(async move {
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
