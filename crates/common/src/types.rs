// Payload types returned by the project browsing and search service.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// One entry of a directory listing. Sub-directories carry a trailing `/`.
///
/// Listing order is whatever the server returned and is not guaranteed to be
/// stable across calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Contents of a single file.
///
/// On the wire this is `{ "binary": bool, "data": string }`, where `data` is
/// base64 when `binary` is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "FileContentsWire", into = "FileContentsWire")]
pub enum FileContents {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContents {
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileContentsWire {
    binary: bool,
    data: String,
}

impl TryFrom<FileContentsWire> for FileContents {
    type Error = base64::DecodeError;

    fn try_from(wire: FileContentsWire) -> Result<Self, Self::Error> {
        if wire.binary {
            BASE64.decode(wire.data.as_bytes()).map(Self::Binary)
        } else {
            Ok(Self::Text(wire.data))
        }
    }
}

impl From<FileContents> for FileContentsWire {
    fn from(contents: FileContents) -> Self {
        match contents {
            FileContents::Text(data) => Self { binary: false, data },
            FileContents::Binary(bytes) => Self { binary: true, data: BASE64.encode(bytes) },
        }
    }
}

/// Result of a project search.
///
/// Older servers send the compact field names (`matchRegexp`, `L`, `T`);
/// both spellings are accepted and the long names are written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    #[serde(rename = "matchPattern", alias = "matchRegexp")]
    pub match_pattern: String,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

impl SearchResult {
    pub fn total_matches(&self) -> usize {
        self.items.iter().map(|item| item.matches.len()).sum()
    }
}

/// All matches found in one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchItem {
    pub path: String,
    #[serde(default)]
    pub matches: Vec<LineMatch>,
}

/// A single matching line (1-based line number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineMatch {
    #[serde(alias = "L")]
    pub line: u32,
    #[serde(alias = "T")]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn directory_entry_marks_dirs() {
        let dir = DirectoryEntry::new("next/");
        let file = DirectoryEntry::new("README.md");
        assert!(dir.is_dir());
        assert!(!file.is_dir());
    }

    #[test]
    fn text_file_contents_keep_data_unchanged() {
        let contents: FileContents =
            serde_json::from_value(json!({ "binary": false, "data": "This is a test readme file." }))
                .unwrap();
        assert_eq!(contents.as_text(), Some("This is a test readme file."));
        assert!(!contents.is_binary());
    }

    #[test]
    fn binary_file_contents_are_base64_decoded() {
        let contents: FileContents =
            serde_json::from_value(json!({ "binary": true, "data": "AAEC/w==" })).unwrap();
        assert_eq!(contents, FileContents::Binary(vec![0, 1, 2, 255]));
        assert_eq!(contents.len(), 4);
        assert_eq!(contents.as_text(), None);
    }

    #[test]
    fn binary_file_contents_serialize_as_base64() {
        let value = serde_json::to_value(FileContents::Binary(vec![0, 1, 2, 255])).unwrap();
        assert_eq!(value, json!({ "binary": true, "data": "AAEC/w==" }));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let result =
            serde_json::from_value::<FileContents>(json!({ "binary": true, "data": "not base64!" }));
        assert!(result.is_err());
    }

    #[test]
    fn file_contents_require_binary_flag() {
        let result = serde_json::from_value::<FileContents>(json!({ "data": "hello" }));
        assert!(result.is_err());
    }

    #[test]
    fn search_result_accepts_compact_field_names() {
        let result: SearchResult = serde_json::from_value(json!({
            "matchRegexp": "[Tt]his is",
            "items": [
                { "path": "/test1/README.md", "matches": [
                    { "L": 1, "T": "This is a test readme file." }
                ] }
            ]
        }))
        .unwrap();

        assert_eq!(result.match_pattern, "[Tt]his is");
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].matches[0].line, 1);
        assert_eq!(result.total_matches(), 1);
    }

    #[test]
    fn search_result_serializes_long_field_names() {
        let result = SearchResult {
            match_pattern: "readme".into(),
            items: vec![SearchItem {
                path: "/a.md".into(),
                matches: vec![LineMatch { line: 3, text: "readme".into() }],
            }],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["matchPattern"], "readme");
        assert_eq!(value["items"][0]["matches"][0]["line"], 3);
        assert_eq!(value["items"][0]["matches"][0]["text"], "readme");
    }

    #[test]
    fn search_result_without_items_is_empty() {
        let result: SearchResult =
            serde_json::from_value(json!({ "matchPattern": "x" })).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_matches(), 0);
    }
}
