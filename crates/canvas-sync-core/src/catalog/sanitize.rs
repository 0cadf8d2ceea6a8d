//! Remote-name sanitization for local paths.

/// Top-level prefix Canvas puts on every folder's `full_name`.
pub const ROOT_MARKER: &str = "course files";

/// Characters that are not allowed in file names on common filesystems.
const FORBIDDEN: &[char] = &['\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every forbidden character with `_`. Idempotent.
pub fn replace_forbidden(s: &str) -> String {
    s.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// `.` and `..` would step out of the course directory.
fn neutralize_dots(component: &str) -> &str {
    match component {
        "." | ".." => "_",
        other => other,
    }
}

/// Local folder path for a remote folder `full_name`.
///
/// `course files/Lectures` becomes `/Lectures`; the root folder becomes `/`.
pub fn folder_path(full_name: &str) -> String {
    let stripped = full_name.strip_prefix(ROOT_MARKER).unwrap_or(full_name);
    if stripped.is_empty() {
        return "/".to_string();
    }
    replace_forbidden(stripped)
        .split('/')
        .map(neutralize_dots)
        .collect::<Vec<_>>()
        .join("/")
}

/// A display name as a single path component: forbidden characters and `/` become `_`.
pub fn sanitize_display_name(name: &str) -> String {
    neutralize_dots(&replace_forbidden(name).replace('/', "_")).to_string()
}

/// Forward slashes only, no doubled separators.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Path of a file inside a folder, e.g. `/Lectures` + `w1.pdf` = `/Lectures/w1.pdf`.
pub fn join_remote(folder: &str, display_name: &str) -> String {
    normalize_path(&format!("{}/{}", folder, sanitize_display_name(display_name)))
}
