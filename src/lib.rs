//! wiseguy is a lazy, composable markup template engine.
//! A template is a markup tree plus transforms that wait for named inputs;
//! templates are layered with `extend` and rendered against an input map.

/// Standard action builders: set attribute, set text, replace, insert
pub mod actions;

/// Command-line interface module for the wiseguy binary
pub mod cli;

/// Declarative template files
/// Supports JSON and YAML formats (wiseguy.json, wiseguy.yml, wiseguy.yaml)
pub mod config;

/// Input maps and values
pub mod context;

/// Error types and handling for wiseguy
pub mod error;

/// Logger setup for the binary
pub mod logger;

/// Owned markup trees, the scraper-backed working document, and serialization
pub mod markup;

/// Registries of named templates
pub mod registry;

/// MiniJinja content expressions
pub mod renderer;

/// Slot collections and the overlay side of `extend`
pub mod subtemplate;

/// Templates and the apply/copy/extend/render protocol
pub mod template;

/// Deferred mutations gated on input keys
pub mod transform;

pub use context::{Context, Value};
pub use error::{Error, Result};
pub use markup::{Document, Element, Markup, Node};
pub use registry::{register_template, Registry};
pub use subtemplate::{Overlay, Slot, SubTemplate};
pub use template::{RenderReport, Template};
pub use transform::Transform;
