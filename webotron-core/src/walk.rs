//! Lazy depth-first traversal of a sync root.
//!
//! [`TreeWalker::walk`] canonicalizes the root, then yields one [`WalkEntry`]
//! per regular file. Subdirectories are expanded as soon as they are met
//! (pre-order); sibling order is whatever the OS listing returns.
//!
//! Symlinks are followed. A directory whose canonical path matches one of
//! the directories currently open above it is a cycle and is skipped with a
//! warning, so every walk terminates.
//!
//! Failures below the root (an unreadable directory, a vanished entry) are
//! yielded as `Err` items and the walk carries on with the next entry.

use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::WalkError;

/// A regular file found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path, below the canonical root.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub key: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalker;

impl TreeWalker {
    /// Start a fresh walk from `root`, which must be an existing directory.
    pub fn walk(root: impl AsRef<Path>) -> Result<Walk, WalkError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|e| WalkError::new(root, e))?;
        let meta = fs::metadata(&canonical).map_err(|e| WalkError::new(&canonical, e))?;
        if !meta.is_dir() {
            return Err(WalkError::new(
                &canonical,
                io::Error::new(io::ErrorKind::InvalidInput, "sync root is not a directory"),
            ));
        }
        let entries = fs::read_dir(&canonical).map_err(|e| WalkError::new(&canonical, e))?;
        debug!(root = %canonical.display(), "Starting tree walk");
        Ok(Walk {
            stack: vec![Frame {
                dir: canonical.clone(),
                canonical: canonical.clone(),
                entries,
            }],
            root: canonical,
        })
    }
}

struct Frame {
    dir: PathBuf,
    canonical: PathBuf,
    entries: ReadDir,
}

/// Iterator returned by [`TreeWalker::walk`].
pub struct Walk {
    root: PathBuf,
    stack: Vec<Frame>,
}

impl std::fmt::Debug for Walk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walk")
            .field("root", &self.root)
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl Walk {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative `/`-joined key for a path under the root.
    pub fn key_for(&self, path: &Path) -> Result<String, WalkError> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            WalkError::new(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path is outside the sync root"),
            )
        })?;
        let mut segments = Vec::new();
        for component in relative.components() {
            let segment = component.as_os_str().to_str().ok_or_else(|| {
                WalkError::new(
                    path,
                    io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
                )
            })?;
            segments.push(segment);
        }
        Ok(segments.join("/"))
    }

    fn descend(&mut self, dir: PathBuf) -> Result<(), WalkError> {
        let canonical = fs::canonicalize(&dir).map_err(|e| WalkError::new(&dir, e))?;
        if self.stack.iter().any(|frame| frame.canonical == canonical) {
            warn!(
                path = %dir.display(),
                target = %canonical.display(),
                "Skipping directory symlink cycle"
            );
            return Ok(());
        }
        let entries = fs::read_dir(&dir).map_err(|e| WalkError::new(&dir, e))?;
        self.stack.push(Frame {
            dir,
            canonical,
            entries,
        });
        Ok(())
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let entry = match frame.entries.next() {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(e)) => return Some(Err(WalkError::new(frame.dir.clone(), e))),
                Some(Ok(entry)) => entry,
            };
            let path = entry.path();
            // fs::metadata follows symlinks.
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => return Some(Err(WalkError::new(path, e))),
            };
            if meta.is_dir() {
                match self.descend(path) {
                    Ok(()) => continue,
                    Err(e) => return Some(Err(e)),
                }
            }
            if meta.is_file() {
                return Some(self.key_for(&path).map(|key| WalkEntry { path, key }));
            }
            debug!(path = %path.display(), "Skipping entry that is neither file nor directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    #[test]
    fn key_for_joins_components_with_forward_slash() {
        let tmp = tempdir().unwrap();
        let walk = TreeWalker::walk(tmp.path()).unwrap();
        let path = walk.root().join("a").join("b").join("c.txt");
        assert_eq!(walk.key_for(&path).unwrap(), "a/b/c.txt");
    }

    #[test]
    fn key_for_rejects_paths_outside_root() {
        let tmp = tempdir().unwrap();
        let other = tempdir().unwrap();
        let walk = TreeWalker::walk(tmp.path()).unwrap();
        assert!(walk.key_for(&other.path().join("x")).is_err());
    }

    #[test]
    fn directory_chains_yield_only_their_files() {
        let tmp = tempdir().unwrap();
        create_dir_all(tmp.path().join("only/deeper")).unwrap();
        write(tmp.path().join("only/deeper/leaf.txt"), "x").unwrap();

        let keys: Vec<_> = TreeWalker::walk(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["only/deeper/leaf.txt"]);
    }
}
