//! Where remote files land on disk.

use std::path::{Path, PathBuf};

use crate::catalog::{normalize_path, sanitize_display_name};

/// Maps `(course code, remote path)` to a local path under the download root.
///
/// By default every course gets its own subdirectory named after its code;
/// in flatten mode all courses share the root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: String,
    flatten: bool,
}

impl Layout {
    pub fn new(root: &Path, flatten: bool) -> Self {
        Self {
            root: normalize_path(&root.to_string_lossy()),
            flatten,
        }
    }

    /// Local directory for a folder path such as `/Lectures`.
    pub fn folder_dir(&self, course_code: &str, folder: &str) -> PathBuf {
        self.destination(course_code, folder)
    }

    /// Local destination for a file path such as `/Lectures/w1.pdf`.
    pub fn destination(&self, course_code: &str, remote_path: &str) -> PathBuf {
        let joined = if self.flatten {
            format!("{}/{}", self.root, remote_path.trim_start_matches('/'))
        } else {
            format!(
                "{}/{}{}",
                self.root,
                sanitize_display_name(course_code),
                remote_path
            )
        };
        PathBuf::from(normalize_path(&joined))
    }
}

/// Human-readable label for a file: course code followed by its remote path.
pub fn label(course_code: &str, remote_path: &str) -> String {
    format!("{course_code}{remote_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_subfolder_layout() {
        let layout = Layout::new(Path::new("/data/canvas/"), false);
        assert_eq!(
            layout.destination("CS101", "/Lectures/w1.pdf"),
            PathBuf::from("/data/canvas/CS101/Lectures/w1.pdf")
        );
        assert_eq!(layout.folder_dir("CS101", "/"), PathBuf::from("/data/canvas/CS101/"));
    }

    #[test]
    fn flatten_layout_drops_course_dir() {
        let layout = Layout::new(Path::new("/data/canvas"), true);
        assert_eq!(
            layout.destination("CS101", "/Lectures/w1.pdf"),
            PathBuf::from("/data/canvas/Lectures/w1.pdf")
        );
        assert_eq!(layout.destination("CS101", "/a.pdf"), PathBuf::from("/data/canvas/a.pdf"));
    }

    #[test]
    fn course_code_cannot_escape_root() {
        let layout = Layout::new(Path::new("."), false);
        assert_eq!(
            layout.destination("EE/CS 2:01", "/x.pdf"),
            PathBuf::from("./EE_CS 2_01/x.pdf")
        );
    }

    #[test]
    fn label_concatenates() {
        assert_eq!(label("CS101", "/Lectures/w1.pdf"), "CS101/Lectures/w1.pdf");
    }
}
