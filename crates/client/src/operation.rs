// Logical operations, their concurrency policies, and in-flight keys.

use std::fmt;

use flame_common::path::{
    canonicalize_project_path, normalize_project_name, normalize_project_path, ROOT_PATH,
};
use flame_common::protocol::methods;
use serde_json::{json, Value};

use crate::fault::Fault;

/// Upper bound on `search` result counts accepted by the client.
pub const MAX_SEARCH_LIMIT: u32 = 10_000;

/// What happens when a call arrives while one with the same key is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// The newer call supersedes the pending one; only its result is delivered.
    CancelPrevious,
    /// The newer call attaches to the pending one and shares its result.
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CheckLogin,
    ListProjects,
    ListDirectory,
    ReadFile,
    Search,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        Self::CheckLogin,
        Self::ListProjects,
        Self::ListDirectory,
        Self::ReadFile,
        Self::Search,
    ];

    /// JSON-RPC method name on the wire.
    pub fn method(self) -> &'static str {
        match self {
            Self::CheckLogin => methods::USER_CHECK_LOGIN,
            Self::ListProjects => methods::PROJECT_GET_LIST,
            Self::ListDirectory => methods::PROJECT_GET_DIRECTORY_CONTENTS,
            Self::ReadFile => methods::PROJECT_GET_FILE_CONTENTS,
            Self::Search => methods::PROJECT_SEARCH,
        }
    }

    pub fn policy(self) -> Policy {
        match self {
            // Users refine these interactively; stale answers are useless.
            Self::Search | Self::ListDirectory | Self::ListProjects => Policy::CancelPrevious,
            Self::ReadFile | Self::CheckLogin => Policy::Coalesce,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A single call against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CheckLogin,
    ListProjects,
    ListDirectory { project: String, path: String },
    ReadFile { project: String, path: String },
    Search { query: String, limit: u32 },
}

impl Operation {
    pub fn list_directory(project: impl Into<String>, path: impl Into<String>) -> Self {
        Self::ListDirectory { project: project.into(), path: path.into() }
    }

    pub fn read_file(project: impl Into<String>, path: impl Into<String>) -> Self {
        Self::ReadFile { project: project.into(), path: path.into() }
    }

    pub fn search(query: impl Into<String>, limit: u32) -> Self {
        Self::Search { query: query.into(), limit }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CheckLogin => OperationKind::CheckLogin,
            Self::ListProjects => OperationKind::ListProjects,
            Self::ListDirectory { .. } => OperationKind::ListDirectory,
            Self::ReadFile { .. } => OperationKind::ReadFile,
            Self::Search { .. } => OperationKind::Search,
        }
    }

    pub fn policy(&self) -> Policy {
        self.kind().policy()
    }

    /// Validate arguments and canonicalize path separators. Idempotent.
    ///
    /// Project names, path components, and queries keep the caller's text;
    /// equivalence for deduplication is decided by `key()`.
    pub fn normalize(self) -> Result<Self, Fault> {
        match self {
            Self::CheckLogin | Self::ListProjects => Ok(self),
            Self::ListDirectory { project, path } => {
                normalize_project_name(&project)?;
                Ok(Self::ListDirectory { project, path: canonicalize_project_path(&path)? })
            }
            Self::ReadFile { project, path } => {
                normalize_project_name(&project)?;
                let path = canonicalize_project_path(&path)?;
                if path == ROOT_PATH {
                    return Err(Fault::invalid_request("file path must not be the project root"));
                }
                Ok(Self::ReadFile { project, path })
            }
            Self::Search { query, limit } => {
                if query.trim().is_empty() {
                    return Err(Fault::invalid_request("search query is empty"));
                }
                if limit == 0 || limit > MAX_SEARCH_LIMIT {
                    return Err(Fault::invalid_request(format!(
                        "search limit must be between 1 and {MAX_SEARCH_LIMIT}, got {limit}"
                    )));
                }
                Ok(Self::Search { query, limit })
            }
        }
    }

    /// Identity used to detect duplicate concurrent requests: trimmed NFC
    /// project names and paths, trimmed queries.
    pub fn key(&self) -> InFlightKey {
        let args = match self {
            Self::CheckLogin | Self::ListProjects => Vec::new(),
            Self::ListDirectory { project, path } | Self::ReadFile { project, path } => vec![
                normalize_project_name(project).unwrap_or_else(|_| project.clone()),
                normalize_project_path(path).unwrap_or_else(|_| path.clone()),
            ],
            Self::Search { query, limit } => vec![query.trim().to_string(), limit.to_string()],
        };
        InFlightKey { kind: self.kind(), args }
    }

    /// JSON-RPC params object.
    pub fn params(&self) -> Value {
        match self {
            Self::CheckLogin | Self::ListProjects => json!({}),
            Self::ListDirectory { project, path } | Self::ReadFile { project, path } => {
                json!({ "project": project, "path": path })
            }
            Self::Search { query, limit } => json!({ "query": query, "n": limit }),
        }
    }
}

/// Operation kind plus normalized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    kind: OperationKind,
    args: Vec<String>,
}

impl InFlightKey {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.args.join(", "))
    }
}
