//! Directory scanning.
//!
//! One call lists one directory: the items found directly inside it and the
//! subdirectories to visit next. The pond drives the recursion, so a
//! directory's files are all known (and become each other's siblings) before
//! anything below it is looked at.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;
use crate::item::ContentItem;

/// What one directory held.
#[derive(Debug)]
pub struct Visit {
    pub dir: PathBuf,
    pub items: Vec<ContentItem>,
    pub subdirs: Vec<PathBuf>,
}

/// Lists `dir`, a directory inside (or equal to) the template `root`.
///
/// Files of no recognised type are skipped with a warning, and so are
/// symlinked directories. A file that cannot be read is an error: its hash
/// needs the bytes.
pub fn scan_dir(root: &Path, dir: &Path) -> Result<Visit, Error> {
    let mut visit = Visit { dir: dir.to_owned(), items: Vec::new(), subdirs: Vec::new() };

    let entries = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in entries {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            visit.subdirs.push(path.to_owned());
            continue;
        }
        if entry.path_is_symlink() && path.is_dir() {
            warn!(dir = %path.display(), "skipping symlinked directory");
            continue;
        }

        let bytes = fs::read(path).map_err(|source| Error::NewItem { path: path.to_owned(), source })?;

        match ContentItem::from_file(root, path, &bytes) {
            Ok(item) => {
                debug!(kind = item.kind().label(), pattern = item.pattern(), file = item.scoped_path(), "discovered");
                visit.items.push(item);
            }
            Err(Error::InvalidExtension(path)) => {
                warn!(file = %path.display(), "skipping file of unrecognised type");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(visit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Kind;

    #[test]
    fn lists_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("b.html"), "b").unwrap();
        fs::write(root.join("_a.html"), "a").unwrap();
        fs::write(root.join("notes.txt"), "skipped").unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested/deep.html"), "deep").unwrap();

        let visit = scan_dir(root, root).unwrap();

        let names: Vec<_> = visit.items.iter().map(|i| i.scoped_path()).collect();
        assert_eq!(names, ["_a.html", "b.html"]);
        assert_eq!(visit.items[0].kind(), &Kind::Fragment);
        assert_eq!(visit.subdirs, [root.join("nested")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("docs/docs.html"), "docs").unwrap();
        std::os::unix::fs::symlink(root, root.join("docs/loop")).unwrap();

        let visit = scan_dir(root, &root.join("docs")).unwrap();
        assert_eq!(visit.items.len(), 1);
        assert!(visit.subdirs.is_empty());

        let pond = crate::Pond::new(root, crate::PondOptions::default()).unwrap();
        assert_eq!(pond.items().count(), 1);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        assert!(scan_dir(dir.path(), &gone).is_err());
    }
}
