//! Asset path normalization shared by states and controllers.
//!
//! Stored paths are relative to the working directory and always use forward
//! slashes, so documents saved on one platform load on another.

use std::path::Path;

/// Normalize `path` into a relative, forward-slash asset path.
///
/// Absolute paths under the current working directory are made relative to it.
/// Anything else is kept as given apart from separator normalization.
pub fn normalize(path: &str) -> String {
    let fs_path = Path::new(path);
    let rel = if fs_path.is_absolute() {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| {
                fs_path
                    .strip_prefix(&cwd)
                    .ok()
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| path.to_string())
    } else {
        path.to_string()
    };
    rel.replace('\\', "/")
}

/// Normalize `path` and force its extension to `ext` (without dot).
pub fn normalize_with_extension(path: &str, ext: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let replaced = Path::new(path).with_extension(ext);
    normalize(&replaced.to_string_lossy())
}

/// File stem of a normalized path ("clips/run.anim" -> "run").
pub fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// True when `path` ends in `.ext`.
pub fn has_extension(path: &str, ext: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy() == ext)
        .unwrap_or(false)
}
