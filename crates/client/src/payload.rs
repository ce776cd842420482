// Typed payloads decoded from raw service responses.

use flame_common::types::{DirectoryEntry, FileContents, SearchResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::fault::Fault;
use crate::operation::OperationKind;

/// Successful result of an operation, one variant per operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    LoggedIn(bool),
    Projects(Vec<String>),
    Directory(Vec<DirectoryEntry>),
    File(FileContents),
    Search(SearchResult),
}

impl Payload {
    /// Decode the raw `result` value for `kind`. Shape mismatches are
    /// protocol faults.
    pub fn decode(kind: OperationKind, raw: Value) -> Result<Self, Fault> {
        match kind {
            OperationKind::CheckLogin => decode_as(kind, raw).map(Self::LoggedIn),
            OperationKind::ListProjects => decode_as(kind, raw).map(Self::Projects),
            OperationKind::ListDirectory => decode_as(kind, raw).map(Self::Directory),
            OperationKind::ReadFile => decode_as(kind, raw).map(Self::File),
            OperationKind::Search => decode_as(kind, raw).map(Self::Search),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::LoggedIn(_) => OperationKind::CheckLogin,
            Self::Projects(_) => OperationKind::ListProjects,
            Self::Directory(_) => OperationKind::ListDirectory,
            Self::File(_) => OperationKind::ReadFile,
            Self::Search(_) => OperationKind::Search,
        }
    }

    pub fn into_logged_in(self) -> Result<bool, Fault> {
        match self {
            Self::LoggedIn(logged_in) => Ok(logged_in),
            other => Err(mismatch(OperationKind::CheckLogin, &other)),
        }
    }

    pub fn into_projects(self) -> Result<Vec<String>, Fault> {
        match self {
            Self::Projects(projects) => Ok(projects),
            other => Err(mismatch(OperationKind::ListProjects, &other)),
        }
    }

    pub fn into_directory(self) -> Result<Vec<DirectoryEntry>, Fault> {
        match self {
            Self::Directory(entries) => Ok(entries),
            other => Err(mismatch(OperationKind::ListDirectory, &other)),
        }
    }

    pub fn into_file(self) -> Result<FileContents, Fault> {
        match self {
            Self::File(contents) => Ok(contents),
            other => Err(mismatch(OperationKind::ReadFile, &other)),
        }
    }

    pub fn into_search(self) -> Result<SearchResult, Fault> {
        match self {
            Self::Search(result) => Ok(result),
            other => Err(mismatch(OperationKind::Search, &other)),
        }
    }
}

fn decode_as<T: DeserializeOwned>(kind: OperationKind, raw: Value) -> Result<T, Fault> {
    serde_json::from_value(raw)
        .map_err(|error| Fault::protocol(format!("malformed `{kind}` response: {error}")))
}

fn mismatch(expected: OperationKind, actual: &Payload) -> Fault {
    Fault::protocol(format!("expected `{expected}` payload, got `{}`", actual.kind()))
}
