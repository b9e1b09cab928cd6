//! `knit_core` is the regeneration engine behind the `knit` command line
//! tool. It finds annotated blocks in ordinary source files, reads the
//! directives that describe where their data and template live, renders the
//! template against the loaded data, and splices the result back between the
//! block markers. Running it twice on the same inputs changes nothing.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source file
//!   -> Splicer (splits the file on `@!knit`, finds `@+knit` in each segment)
//!   -> Directive parser (reads `@knit <kind> <value>` lines above the block)
//!   -> Generator (resolves loader, input and template, renders with minijinja)
//!   -> Formatter (optional, by file extension)
//!   -> Driver (fingerprints old and new text, writes only on change)
//! ```
//!
//! ## Directives
//!
//! ```go
//! /*
//! @knit loader json
//! @knit input `{"A": "b"}`
//! @knit template `{% for k, v in data|items -%}
//! const {{ k }} = "{{ v }}"
//! {% endfor %}`
//! */
//! // @+knit
//! const A = "b"
//! // @!knit
//! ```
//!
//! - `input` names a file, or carries a backtick literal. The short value of
//!   a literal input (the `json` in ``@knit input json`{}` ``) doubles as the
//!   loader type when no `loader` directive is present.
//! - `loader` is one of `json`, `yaml`, `yml`, `graphql` or `openapi3`.
//! - `template` names a minijinja template file, or carries a literal.
//! - `variable` binds a value exposed to the template as `vars.<name>`.
//!
//! Plain values expand `$NAME` and `${NAME}` from the environment. Literals
//! are taken verbatim except that `` \` `` becomes a backtick.
//!
//! ## Key Types
//!
//! - [`Directive`] - One parsed `@knit` declaration.
//! - [`Loader`] - The closed set of schema loaders.
//! - [`GenerationContext`] - A block's resolved loader, input and template.
//! - [`Knit`] - The file driver, configured by [`KnitOptions`].
//! - [`ProcessResult`] - The per-file outcome reported by the driver.
//! - [`KnitConfig`] - Configuration loaded from `knit.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use knit_core::Knit;
//! use knit_core::KnitOptions;
//!
//! let knit = Knit::new(KnitOptions::default());
//! knit.process_files(&[PathBuf::from("models.go")], |result| {
//! 	if let Some(error) = &result.error {
//! 		eprintln!("{}: {error}", result.path.display());
//! 	}
//! });
//! ```

pub use config::*;
pub use directive::*;
pub use driver::*;
pub use error::*;
pub use formatter::*;
pub use generator::*;
pub use loader::*;
pub use splicer::Spliced;
pub use splicer::splice;
pub use splicer::splice_blocks;

pub mod config;
mod directive;
mod driver;
#[allow(unused_assignments)]
mod error;
mod filters;
mod formatter;
mod generator;
mod graphql;
pub(crate) mod lexer;
mod loader;
mod openapi;
mod splicer;

#[cfg(test)]
mod __fixtures;
