use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::http::header::normalize_path;
use crate::http::page::Page;
use crate::session::SessionStore;

/// Page registry, session store and configuration shared by every
/// connection.
///
/// Pages are registered before the server is wrapped in an `Arc` and
/// handed to the listener; after that the registry is only read.
pub struct HttpServer {
    config: Config,
    pages: HashMap<String, Box<dyn Page>>,
    default_page: Option<Box<dyn Page>>,
    sessions: Arc<SessionStore>,
}

impl HttpServer {
    pub fn new(config: Config) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session.ttl()));
        Self {
            config,
            pages: HashMap::new(),
            default_page: None,
            sessions,
        }
    }

    /// Registers `page` under `name`. A missing leading `/` is added.
    pub fn set_page(&mut self, name: &str, page: impl Page + 'static) {
        let path = normalize_path(name);
        tracing::debug!(path = %path, "Page registered");
        self.pages.insert(path, Box::new(page));
    }

    /// Page used when no registered path matches.
    pub fn set_default_page(&mut self, page: impl Page + 'static) {
        self.default_page = Some(Box::new(page));
    }

    /// Exact-match lookup, falling back to the default page.
    pub fn page(&self, path: &str) -> Option<&dyn Page> {
        self.pages
            .get(path)
            .or(self.default_page.as_ref())
            .map(|page| &**page)
    }

    pub fn has_page(&self, path: &str) -> bool {
        self.pages.contains_key(path)
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server_name(&self) -> &str {
        &self.config.server.server_name
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
