// Typed API surface handed to consumers.

use flame_common::types::{DirectoryEntry, FileContents, SearchResult};

use crate::config::{ClientConfig, ConfigError};
use crate::manager::{Pending, RequestManager};
use crate::operation::Operation;
use crate::payload::Payload;
use crate::transport::{EndpointTransport, Transport, TransportError};

/// Project browsing and search client.
///
/// Constructed explicitly and passed to whoever needs it; clones share one
/// request manager. Every method issues (or joins) its request immediately
/// and returns a handle, so dropping the handle does not stop the request.
pub struct ApiClient<T> {
    manager: RequestManager<T>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self { manager: self.manager.clone() }
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { manager: RequestManager::new(transport) }
    }

    pub fn with_manager(manager: RequestManager<T>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &RequestManager<T> {
        &self.manager
    }

    pub fn check_login(&self) -> Pending<bool> {
        self.manager.invoke(Operation::CheckLogin).typed(Payload::into_logged_in)
    }

    /// Project names in server order.
    pub fn project_list(&self) -> Pending<Vec<String>> {
        self.manager.invoke(Operation::ListProjects).typed(Payload::into_projects)
    }

    pub fn directory_contents(&self, project: &str, path: &str) -> Pending<Vec<DirectoryEntry>> {
        self.manager
            .invoke(Operation::list_directory(project, path))
            .typed(Payload::into_directory)
    }

    pub fn file_contents(&self, project: &str, path: &str) -> Pending<FileContents> {
        self.manager.invoke(Operation::read_file(project, path)).typed(Payload::into_file)
    }

    pub fn search(&self, query: &str, limit: u32) -> Pending<SearchResult> {
        self.manager.invoke(Operation::search(query, limit)).typed(Payload::into_search)
    }
}

/// Failure to build a client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiClient<EndpointTransport> {
    /// Build a client for the configured endpoint and deadlines.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConnectError> {
        let endpoint = config.endpoint()?;
        let transport = EndpointTransport::connect(&endpoint)?;
        tracing::debug!(%endpoint, "connected api client");
        Ok(Self::with_manager(RequestManager::with_timeouts(transport, config.timeouts.clone())))
    }
}
