//! Stylesheet site builder for monodocs.
//!
//! Compiles a directory of SCSS/CSS stylesheets into CSS, token JSON and
//! CommonJS modules, copying referenced assets under content-hashed names.

pub mod assets;
pub mod builder;
pub mod watcher;

pub use assets::{AssetCopier, AssetPipeline};
pub use builder::{is_stylesheet, BuildConfig, BuildError, BuildResult, StylesheetBuilder};
pub use watcher::{StyleWatcher, WatchEvent};
