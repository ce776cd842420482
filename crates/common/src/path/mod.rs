pub mod normalize;

pub use normalize::{
    canonicalize_project_path, normalize_project_name, normalize_project_path, PathError,
    MAX_PATH_CHARS, ROOT_PATH,
};
