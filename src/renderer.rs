//! Content expressions for declaratively defined transforms.
//! Expressions are MiniJinja templates rendered with a transform's resolved
//! inputs, e.g. `"{{ title }} | My Site"`.
use std::sync::Arc;

use minijinja::Environment;

use crate::context::Context;
use crate::error::{Error, Result};

/// Trait for content expression engines.
pub trait ContentRenderer: Send + Sync {
    /// Renders an expression with the given context.
    ///
    /// # Arguments
    /// * `template` - Expression source to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered text
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based expression renderer.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new MiniJinjaRenderer instance with default environment.
    pub fn new() -> Self {
        let env = Environment::new();
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl ContentRenderer for MiniJinjaRenderer {
    /// Renders an expression using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if the expression fails to parse or render
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        self.env
            .render_str(template, context)
            .map_err(Error::MinijinjaError)
    }
}

/// Content function rendering `expression` against a transform's resolved
/// inputs.
pub fn expression(
    renderer: Arc<dyn ContentRenderer>,
    expression: String,
) -> impl Fn(&Context) -> Result<String> + Send + Sync + 'static {
    move |ctx: &Context| renderer.render(&expression, &ctx.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minijinja_renderer() {
        let renderer = MiniJinjaRenderer::new();
        let context = json!({"name": "test", "value": 42});

        let result = renderer.render("Hello {{ name }}!", &context).unwrap();
        assert_eq!(result, "Hello test!");

        let result = renderer.render("Value: {{ value }}", &context).unwrap();
        assert_eq!(result, "Value: 42");
    }

    #[test]
    fn test_invalid_expression() {
        let renderer = MiniJinjaRenderer::new();
        let err = renderer.render("{{ name ", &json!({})).unwrap_err();
        assert!(matches!(err, Error::MinijinjaError(_)));
    }

    #[test]
    fn test_expression_reads_resolved_inputs() {
        let content = expression(
            Arc::new(MiniJinjaRenderer::new()),
            "{{ title }} | {{ site }}".to_string(),
        );
        let ctx = Context::new().with("title", "Home").with("site", "Wiki");
        assert_eq!(content(&ctx).unwrap(), "Home | Wiki");
    }
}
