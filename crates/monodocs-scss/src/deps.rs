//! Discovery of dependency (`node_modules`) directories.

use std::io;
use std::path::{Path, PathBuf};

/// Dependency directories found on the ancestor chain of a start directory,
/// nearest first.
///
/// Computed once by the build driver and handed to every compiler, since it
/// only depends on the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyDirs {
    dirs: Vec<PathBuf>,
}

impl DependencyDirs {
    /// Name of the dependency folder looked up in each ancestor.
    pub const FOLDER: &'static str = "node_modules";

    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Walk from `start` up to the filesystem root collecting every
    /// `node_modules` directory.
    pub fn discover(start: &Path) -> Self {
        let dirs: Vec<PathBuf> = start
            .ancestors()
            .map(|dir| dir.join(Self::FOLDER))
            .filter(|candidate| candidate.is_dir())
            .collect();

        tracing::debug!(
            "Found {} dependency directories from {}",
            dirs.len(),
            start.display()
        );

        Self { dirs }
    }

    /// [`discover`](Self::discover) from the current working directory.
    pub fn from_current_dir() -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::discover(&cwd))
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// First existing `<dir>/<relative>` across the directories.
    pub fn find(&self, relative: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.exists())
    }
}
