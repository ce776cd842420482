// RPC method name constants — derived from contracts/jsonrpc-methods.json.

// ── User ───────────────────────────────────────────────────────────
pub const USER_CHECK_LOGIN: &str = "user.checkLogin";

// ── Project ────────────────────────────────────────────────────────
pub const PROJECT_GET_LIST: &str = "project.getList";
pub const PROJECT_GET_DIRECTORY_CONTENTS: &str = "project.getDirectoryContents";
pub const PROJECT_GET_FILE_CONTENTS: &str = "project.getFileContents";
pub const PROJECT_SEARCH: &str = "project.search";

/// All methods the client issues.
pub const IMPLEMENTED_METHODS: &[&str] = &[
    USER_CHECK_LOGIN,
    PROJECT_GET_LIST,
    PROJECT_GET_DIRECTORY_CONTENTS,
    PROJECT_GET_FILE_CONTENTS,
    PROJECT_SEARCH,
];
