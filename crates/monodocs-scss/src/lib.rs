//! SCSS compiler with CSS-Modules style local scoping.
//!
//! Stylesheets are compiled with `grass`, then the flat CSS output is rewritten so
//! that class and keyframes names in `*.module.scss` files become file-unique
//! scoped names. `:global(...)` and `@-global-keyframes` opt out of scoping, and
//! `url(...)` references can be remapped to content-addressed asset paths.

pub mod compiler;
pub mod deps;
pub mod error;
pub mod globals;
pub mod module;
pub mod naming;
pub mod scopes;
pub mod tokens;
pub mod urls;

mod scan;

pub use compiler::{CompiledResult, CompilerOptions, CssHook, OutputStyle, ScssCompiler};
pub use deps::DependencyDirs;
pub use error::{CompileError, ScssError};
pub use globals::{extract_globals, ExtractedGlobals};
pub use module::{render_asset_module, render_css_module, CssModule};
pub use naming::{is_module_file, ScopedNameFactory, ScopedNameGenerator, ScopedNames};
pub use scopes::{add_scopes, ScopedExports};
pub use tokens::{camel_case, TokenTransformer, Tokens};
pub use urls::{rewrite_urls, MappedFile, UrlMapper};
