//! File-access capability consulted by connection handlers.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Outcome of looking up a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NotFound,
}

/// Maps a request path to text content.
///
/// Implementations may block; handlers call them off the async worker
/// threads. An `Err` is reported to the peer as a server error.
pub trait Resolver: Send + Sync + 'static {
    fn resolve(&self, path: &str) -> io::Result<Resolution>;
}

/// Serves regular files from the local filesystem.
///
/// Paths are taken as given (relative to the working directory) unless a
/// root is configured, in which case they are joined onto it. A rooted
/// resolver never looks outside its root: `..` and absolute components
/// resolve to [`Resolution::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    root: Option<PathBuf>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        let Some(root) = &self.root else {
            return Some(PathBuf::from(path));
        };

        let relative = Path::new(path.trim_start_matches('/'));
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        confined.then(|| root.join(relative))
    }
}

impl Resolver for FsResolver {
    fn resolve(&self, path: &str) -> io::Result<Resolution> {
        if path.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let Some(target) = self.locate(path) else {
            return Ok(Resolution::NotFound);
        };
        if !target.is_file() {
            return Ok(Resolution::NotFound);
        }

        match std::fs::read_to_string(&target) {
            Ok(content) => Ok(Resolution::Found(content)),
            // removed between the check and the read
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Resolution::NotFound),
            Err(e) => Err(e),
        }
    }
}

/// Serves a fixed set of in-memory documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    documents: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.insert(path.into(), content.into());
        self
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&self, path: &str) -> io::Result<Resolution> {
        Ok(self
            .documents
            .get(path)
            .map(|c| Resolution::Found(c.clone()))
            .unwrap_or(Resolution::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fetchline-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_regular_file_under_root() {
        let dir = scratch_dir("root");
        std::fs::write(dir.join("hello.txt"), "hi").unwrap();

        let resolver = FsResolver::rooted(&dir);
        assert_eq!(resolver.resolve("hello.txt").unwrap(), Resolution::Found("hi".into()));
        assert_eq!(resolver.resolve("/hello.txt").unwrap(), Resolution::Found("hi".into()));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn rooted_lookups_cannot_escape_root() {
        let dir = scratch_dir("escape");
        let inner = dir.join("inner");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(dir.join("secret.txt"), "SECRET").unwrap();
        std::fs::write(inner.join("open.txt"), "open").unwrap();

        let resolver = FsResolver::rooted(&inner);
        assert_eq!(resolver.resolve("../secret.txt").unwrap(), Resolution::NotFound);
        assert_eq!(resolver.resolve("./../secret.txt").unwrap(), Resolution::NotFound);
        assert_eq!(resolver.resolve("sub/../../secret.txt").unwrap(), Resolution::NotFound);

        let absolute = dir.join("secret.txt");
        assert_eq!(resolver.resolve(absolute.to_str().unwrap()).unwrap(), Resolution::NotFound);

        assert_eq!(resolver.resolve("./open.txt").unwrap(), Resolution::Found("open".into()));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn directories_and_missing_files_are_not_found() {
        let dir = scratch_dir("dirs");
        let resolver = FsResolver::new();

        assert_eq!(resolver.resolve(dir.to_str().unwrap()).unwrap(), Resolution::NotFound);
        assert_eq!(resolver.resolve("./definitely/missing.txt").unwrap(), Resolution::NotFound);
        assert_eq!(resolver.resolve("").unwrap(), Resolution::NotFound);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn memory_resolver_matches_exact_paths() {
        let resolver = MemoryResolver::new().with("./data/hello.txt", "hi");
        assert_eq!(resolver.resolve("./data/hello.txt").unwrap(), Resolution::Found("hi".into()));
        assert_eq!(resolver.resolve("data/hello.txt").unwrap(), Resolution::NotFound);
    }
}
