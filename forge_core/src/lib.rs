//! `forge_core` is the core library for `forge-templates`, an HTML template
//! engine with single-level template inheritance. It provides the segment
//! model, directive recognition, block extraction and replacement, the
//! renderer, expression helpers, and the loader that turns a folder of
//! template files into a renderable set.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Template folder
//!   → Discovery (walks the folder, derives names like `pages/home`)
//!   → Lexer (splits each file into literal chunks and `${ expression }` holes)
//!   → Compiler (validates expressions, optionally minifies literals)
//!   → Bundle (one JSON artifact holding every compiled template)
//!   → TemplateSet (binds templates to the expression environment)
//!   → Renderer (produces segments, resolves `{{ extend }}` and blocks, flattens)
//! ```
//!
//! ## Directives
//!
//! A directive is an expression whose whole value is one of:
//!
//! - `{{ name }}` opens the block `name`.
//! - `{{ end }}` closes the open block.
//! - `{{ extend base }}` makes the template a child of `base`.
//!
//! A child template contributes only its blocks. The base is rendered with
//! the same data and each of its blocks is replaced by the child's version,
//! when the child defines one.
//!
//! ## Quick Start
//!
//! ```rust
//! use forge_core::TemplateLoader;
//!
//! let templates = TemplateLoader::default()
//! 	.load_sources([
//! 		(
//! 			"layout",
//! 			r#"<main>${ "{{ content }}" }default${ "{{ end }}" }</main>"#,
//! 		),
//! 		(
//! 			"home",
//! 			r#"${ "{{ extend layout }}" }${ "{{ content }}" }Hi ${ name }${ "{{ end }}" }"#,
//! 		),
//! 	])
//! 	.unwrap();
//!
//! let html = templates
//! 	.render("home", &serde_json::json!({ "name": "Ada" }))
//! 	.unwrap();
//! assert_eq!(html, "<main>Hi Ada</main>");
//! ```

pub use blocks::*;
pub use bundle::*;
pub use config::*;
pub use directive::*;
pub use discover::*;
pub use error::*;
pub use helpers::*;
pub use lexer::*;
pub use render::*;
pub use segment::*;
pub use template::*;

mod blocks;
pub mod bundle;
pub mod config;
mod directive;
pub mod discover;
#[allow(unused_assignments)]
mod error;
pub mod helpers;
mod lexer;
mod render;
mod segment;
mod template;
