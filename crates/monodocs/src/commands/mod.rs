//! CLI commands.

pub mod build;
pub mod compile;
pub mod init;
pub mod watch;

use anyhow::{Context, Result};
use monodocs_scss::DependencyDirs;

/// Dependency directories above the working directory, shared by every command
/// so `~` urls and Sass imports resolve the same way everywhere.
pub(crate) fn dependency_dirs() -> Result<DependencyDirs> {
    DependencyDirs::from_current_dir().context("Failed to read current directory")
}
