//! Slash-separated path helpers.
//!
//! Paths are relative to the repository root and never start or end with
//! `/`. The root directory itself is the empty string.

/// Strip leading `/` or `./` and trailing `/` so caller input matches tree
/// listing keys.
pub fn normalize(path: &str) -> &str {
    let mut p = path;
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest;
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest;
        } else {
            break;
        }
    }
    p.trim_end_matches('/')
}

/// Last segment of `path`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parent directory of `path`; `""` for top-level entries.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Check whether `child` sits exactly one segment below `dir`.
pub fn is_direct_child(dir: &str, child: &str) -> bool {
    if child.is_empty() {
        return false;
    }
    if dir.is_empty() {
        return !child.contains('/');
    }
    match child.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// Ancestor directories of `path`, deepest first, ending with the root `""`.
///
/// `ancestors("a/b/c.txt")` yields `["a/b", "a", ""]`.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    loop {
        current = dirname(current);
        out.push(current);
        if current.is_empty() {
            return out;
        }
    }
}

/// Join a directory and a relative path.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_and_dirname() {
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("Readme.md"), "Readme.md");
        assert_eq!(dirname("a/b/c.txt"), "a/b");
        assert_eq!(dirname("Readme.md"), "");
    }

    #[test]
    fn direct_children_of_root() {
        assert!(is_direct_child("", "Readme.md"));
        assert!(is_direct_child("", "lib"));
        assert!(!is_direct_child("", "lib/repo.rs"));
        assert!(!is_direct_child("", ""));
    }

    #[test]
    fn direct_children_of_nested_dir() {
        assert!(is_direct_child("test", "test/shared.js"));
        assert!(is_direct_child("a/b", "a/b/c"));
        assert!(!is_direct_child("a/b", "a/b/c/d"));
        assert!(!is_direct_child("a/b", "a/b"));
        assert!(!is_direct_child("test", "tests/shared.js"));
        // Segments must match, not just their concatenation.
        assert!(!is_direct_child("ab", "a/b"));
        assert!(!is_direct_child("a/b", "ab/c"));
    }

    #[test]
    fn ancestors_run_deepest_first_to_root() {
        assert_eq!(ancestors("a/b/c/Readme.md"), vec!["a/b/c", "a/b", "a", ""]);
        assert_eq!(ancestors("Readme.md"), vec![""]);
    }

    #[test]
    fn relative_paths() {
        assert_eq!(join("a/b", "c.txt"), "a/b/c.txt");
        assert_eq!(join("", "c.txt"), "c.txt");
    }

    #[test]
    fn normalize_strips_decoration() {
        assert_eq!(normalize("/a/b/"), "a/b");
        assert_eq!(normalize("./a"), "a");
        assert_eq!(normalize("a/b"), "a/b");
        assert_eq!(normalize("/"), "");
    }
}
