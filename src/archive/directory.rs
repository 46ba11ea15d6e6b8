// This module maps archives onto directory trees. DirectoryArchive is a sink that writes each
// entry to <root>/<entry path>, creating parent directories as needed. It refuses to start in
// a non-empty directory and to overwrite an existing file, so a duplicate entry surfaces the
// same way it would for an in-memory archive. read_module_dir walks a module's output
// directory with walkdir, following symlinks, and returns its files as archive entries with
// '/'-separated relative paths, sorted so that the offer order never depends on the
// platform's directory iteration order.

//! Directory-backed archives and module directory reading.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::{ArchiveEntry, ArchiveError, ArchiveResult, ArchiveSink};

/// Archive laid out as a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Use `root` as the archive root, creating it if missing.
    ///
    /// An existing `root` must be empty.
    pub fn create(root: impl Into<PathBuf>) -> ArchiveResult<Self> {
        let root = root.into();
        let io_err = |source| ArchiveError::Io {
            path: root.clone(),
            source,
        };
        fs::create_dir_all(&root).map_err(io_err)?;
        if fs::read_dir(&root).map_err(io_err)?.next().is_some() {
            return Err(ArchiveError::OutputNotEmpty { path: root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> ArchiveResult<PathBuf> {
        let invalid = |reason: &str| ArchiveError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }
        let mut target = self.root.clone();
        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => target.push(part),
                _ => return Err(invalid("path escapes the archive root")),
            }
        }
        Ok(target)
    }
}

impl ArchiveSink for DirectoryArchive {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> ArchiveResult<()> {
        let target = self.resolve(path)?;
        let io_err = |source| ArchiveError::Io {
            path: target.clone(),
            source,
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ArchiveError::DuplicateEntry {
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(io_err(e)),
        };
        file.write_all(contents).map_err(io_err)?;
        log::trace!("wrote {} ({} bytes)", target.display(), contents.len());
        Ok(())
    }
}

/// Collect every file under `root` as an archive entry, sorted by path.
pub fn read_module_dir(root: &Path) -> ArchiveResult<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();

    for item in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let item = item.map_err(|source| ArchiveError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !item.file_type().is_file() {
            continue;
        }

        let relative = item.path().strip_prefix(root).unwrap_or(item.path());
        let path = archive_path(relative)?;
        let contents = fs::read(item.path()).map_err(|source| ArchiveError::Io {
            path: item.path().to_path_buf(),
            source,
        })?;
        entries.push(ArchiveEntry { path, contents });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    log::debug!("{}: {} file(s)", root.display(), entries.len());
    Ok(entries)
}

fn archive_path(relative: &Path) -> ArchiveResult<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(s) => segments.push(s),
                None => {
                    return Err(ArchiveError::InvalidPath {
                        path: relative.display().to_string(),
                        reason: "file name is not valid UTF-8".to_string(),
                    })
                }
            },
            Component::CurDir => {}
            _ => {
                return Err(ArchiveError::InvalidPath {
                    path: relative.display().to_string(),
                    reason: "not relative to the module root".to_string(),
                })
            }
        }
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_parents() {
        let dir = tempdir().unwrap();
        let mut archive = DirectoryArchive::create(dir.path().join("out")).unwrap();
        archive
            .write_entry("META-INF/truffle/language", b"language1.id=js\n")
            .unwrap();
        let written = fs::read_to_string(dir.path().join("out/META-INF/truffle/language")).unwrap();
        assert_eq!(written, "language1.id=js\n");
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let mut archive = DirectoryArchive::create(dir.path()).unwrap();
        for bad in ["", "/etc/passwd", "a//b", "../x", "a/./b"] {
            assert!(
                matches!(archive.write_entry(bad, b""), Err(ArchiveError::InvalidPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_write_twice_is_duplicate() {
        let dir = tempdir().unwrap();
        let mut archive = DirectoryArchive::create(dir.path()).unwrap();
        archive.write_entry("a.txt", b"1").unwrap();
        assert!(matches!(
            archive.write_entry("a.txt", b"2"),
            Err(ArchiveError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn test_create_refuses_non_empty_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("stale.class"), "x").unwrap();
        assert!(matches!(
            DirectoryArchive::create(dir.path()),
            Err(ArchiveError::OutputNotEmpty { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_module_dir_follows_symlinks() {
        let dir = tempdir().unwrap();
        let shared = dir.path().join("shared");
        let module = dir.path().join("module");
        fs::create_dir_all(&shared).unwrap();
        fs::create_dir_all(module.join("META-INF/truffle")).unwrap();
        fs::write(shared.join("language"), "language1.id=js\n").unwrap();
        fs::write(shared.join("Foo.class"), "foo").unwrap();
        std::os::unix::fs::symlink(shared.join("language"), module.join("META-INF/truffle/language"))
            .unwrap();
        std::os::unix::fs::symlink(shared.join("Foo.class"), module.join("Foo.class")).unwrap();

        let entries = read_module_dir(&module).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["Foo.class", "META-INF/truffle/language"]);
        assert_eq!(entries[1].contents, b"language1.id=js\n");
    }

    #[test]
    fn test_read_module_dir_sorted_relative_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("META-INF/truffle")).unwrap();
        fs::create_dir_all(dir.path().join("com/acme")).unwrap();
        fs::write(dir.path().join("META-INF/truffle/language"), "language1.id=js\n").unwrap();
        fs::write(dir.path().join("com/acme/Foo.class"), [0xca, 0xfe]).unwrap();

        let entries = read_module_dir(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["META-INF/truffle/language", "com/acme/Foo.class"]);
        assert_eq!(entries[1].contents, [0xca, 0xfe]);
    }
}
