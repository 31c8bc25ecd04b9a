//! Legacy template discovery.

use std::fs;
use std::io;
use std::path::Path;

/// File extension that marks a legacy template.
pub(crate) const TEMPLATE_EXTENSION: &str = "txt";

/// A legacy template found on disk, named by its extension-less path
/// relative to the input root.
#[derive(Debug)]
pub(crate) struct LegacyTemplate {
    pub name: String,
    pub data: Vec<u8>,
}

/// Finds every `.txt` template under `root`, recursing into
/// subdirectories when asked. Results are sorted by name so batch output
/// is deterministic regardless of directory iteration order.
pub(crate) fn discover(root: &Path, recursive: bool) -> io::Result<Vec<LegacyTemplate>> {
    let mut templates = Vec::new();
    walk(root, root, recursive, &mut templates)?;
    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(templates)
}

fn walk(
    root: &Path,
    dir: &Path,
    recursive: bool,
    out: &mut Vec<LegacyTemplate>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                walk(root, &path, recursive, out)?;
            }
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let name = rel.with_extension("").to_string_lossy().into_owned();
        let data = fs::read(&path)?;
        out.push(LegacyTemplate { name, data });
    }
    Ok(())
}

/// Keeps only the templates named in `only`. Names are extension-less
/// relative paths exactly as [`discover`] produces them; names that match
/// nothing are silently ignored.
pub(crate) fn retain_named(templates: &mut Vec<LegacyTemplate>, only: &[String]) {
    templates.retain(|t| only.iter().any(|name| name == &t.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn finds_only_template_extension_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "page.txt", "x");
        write(dir.path(), "notes.md", "x");
        write(dir.path(), "raw", "x");

        let found = discover(dir.path(), false).unwrap();
        let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["page"]);
    }

    #[test]
    fn skips_subdirectories_unless_recursive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.txt", "x");
        write(dir.path(), "sub/inner.txt", "x");

        let flat = discover(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1, "non-recursive sees only the top level");

        let deep = discover(dir.path(), true).unwrap();
        let names: Vec<&str> = deep.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sub/inner", "top"], "sorted, relative names");
    }

    #[test]
    fn retain_named_filters_by_exact_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "x");
        write(dir.path(), "b.txt", "x");
        write(dir.path(), "ab.txt", "x");

        let mut found = discover(dir.path(), false).unwrap();
        retain_named(&mut found, &["a".to_owned(), "missing".to_owned()]);
        let names: Vec<&str> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a"], "only exact names survive the filter");
    }
}
