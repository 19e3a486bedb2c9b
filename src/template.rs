//! Templates: a markup tree plus the transforms still waiting to run on it.
//!
//! A template definition is never mutated by rendering. Every render works on
//! a [`Template::copy`], so one definition can serve any number of renders,
//! including concurrent ones.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::context::{Context, Value};
use crate::error::Result;
use crate::markup::{Document, Element};
use crate::subtemplate::{Overlay, Slot};
use crate::transform::Transform;

/// Transforms that fired during one [`Template::apply`] call, in firing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub fired: Vec<String>,
}

/// A transform left unresolved after a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransform {
    pub label: String,
    pub missing: Vec<String>,
}

/// Result of [`Template::render_report`].
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub tree: Element,
    pub fired: Vec<String>,
    pub pending: Vec<PendingTransform>,
}

impl RenderReport {
    /// Whether every transform ran.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn markup(&self, pretty: bool) -> String {
        self.tree.serialize(pretty)
    }
}

/// An owned root element and an ordered list of pending transforms.
#[derive(Debug, Clone)]
pub struct Template {
    root: Element,
    transforms: Vec<Transform>,
}

impl Template {
    pub fn new(root: Element) -> Self {
        Self {
            root,
            transforms: Vec::new(),
        }
    }

    /// Appends a transform; transforms run in the order they were added.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Union of the keys still pending across all transforms.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.transforms
            .iter()
            .flat_map(|t| t.pending_keys())
            .collect()
    }

    /// Transforms still waiting for input, with the keys they lack.
    pub fn pending(&self) -> Vec<PendingTransform> {
        self.transforms
            .iter()
            .map(|t| PendingTransform {
                label: t.label().to_string(),
                missing: t.pending_keys().map(str::to_string).collect(),
            })
            .collect()
    }

    /// Feeds `input` to every transform once.
    ///
    /// Transforms that become ready run against the root immediately and are
    /// retired. This is a single pass: a transform is not revisited within
    /// the same call.
    ///
    /// # Errors
    /// Propagates the first error raised by a transform action, e.g.
    /// `MarkupError::NoMatch` for an `insert` whose selector matches nothing.
    /// The failing transform stays in place, ready to run on the next call;
    /// transforms that already ran in this pass keep their effect.
    pub fn apply(&mut self, input: &Context) -> Result<ApplyReport> {
        trace!(
            "Applying {} input(s) to {} transform(s)",
            input.len(),
            self.transforms.len()
        );
        let mut report = ApplyReport::default();
        let mut doc = Document::from(&self.root);
        let outcome = self.fire_ready(&mut doc, input, &mut report);
        self.root = doc.to_element()?;
        outcome.map(|_| report)
    }

    fn fire_ready(
        &mut self,
        doc: &mut Document,
        input: &Context,
        report: &mut ApplyReport,
    ) -> Result<()> {
        let mut index = 0;
        while index < self.transforms.len() {
            if self.transforms[index].apply(input) {
                self.transforms[index].run(doc)?;
                let transform = self.transforms.remove(index);
                debug!("Applied transform '{}'", transform.label());
                report.fired.push(transform.label().to_string());
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    /// A structurally independent clone with every transform reset to its
    /// definition.
    pub fn copy(&self) -> Self {
        Self {
            root: self.root.clone(),
            transforms: self.transforms.iter().map(Transform::reset).collect(),
        }
    }

    /// Layers `overlay` on top of this template.
    ///
    /// The overlay's transforms are appended after this template's own, so
    /// they run later and win on overlapping targets. Whatever the overlay
    /// can produce without input is applied right away; the rest stays
    /// pending for render time. Neither `self` nor `overlay` is modified.
    pub fn extend<O: Overlay + ?Sized>(&self, overlay: &O) -> Result<Self> {
        let mut base = self.copy();
        base.transforms
            .extend(overlay.overlay_transforms().iter().map(Transform::reset));
        let slots = overlay.slots(&Context::new())?;
        let report = base.apply(&slots)?;
        for transform in &mut base.transforms {
            transform.bind();
        }
        debug!(
            "Extended template: {} transform(s) resolved, {} pending",
            report.fired.len(),
            base.transforms.len()
        );
        Ok(base)
    }

    /// Renders into a fresh tree without serializing it.
    pub fn render_tree(&self, input: &Context) -> Result<Element> {
        let mut scratch = self.copy();
        scratch.apply(input)?;
        Ok(scratch.root)
    }

    /// Renders to pretty-printed markup.
    pub fn render(&self, input: &Context) -> Result<String> {
        Ok(self.render_tree(input)?.serialize(true))
    }

    /// Renders and reports which transforms fired and which were left
    /// pending for lack of input.
    pub fn render_report(&self, input: &Context) -> Result<RenderReport> {
        let mut scratch = self.copy();
        let applied = scratch.apply(input)?;
        let pending = scratch.pending();
        Ok(RenderReport {
            tree: scratch.root,
            fired: applied.fired,
            pending,
        })
    }
}

impl Slot for Template {
    fn produce(&self, input: &Context) -> Result<Value> {
        Ok(Value::Markup(self.render_tree(input)?))
    }

    fn exposed_transforms(&self) -> Vec<Transform> {
        self.transforms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{from_key, insert, node_from_key, set_text};
    use crate::error::Error;
    use crate::markup::{Markup, MarkupError};

    fn base() -> Template {
        Template::new(Element::new("div").with_attr("id", "main"))
            .with_transform(Transform::new(["title"], set_text("#main", from_key("title"))))
    }

    #[test]
    fn test_render_with_and_without_input() {
        let template = base();
        let html = template
            .render(&Context::new().with("title", "Hello"))
            .unwrap();
        assert_eq!(html, "<div id=\"main\">Hello</div>\n");

        let html = template.render(&Context::new()).unwrap();
        assert_eq!(html, "<div id=\"main\"></div>\n");
    }

    #[test]
    fn test_apply_retires_fired_transforms() {
        let mut template = base();
        let report = template.apply(&Context::new()).unwrap();
        assert!(report.fired.is_empty());
        assert_eq!(template.transforms().len(), 1);

        let report = template.apply(&Context::new().with("title", "x")).unwrap();
        assert_eq!(report.fired, vec!["title".to_string()]);
        assert!(template.transforms().is_empty());
        assert_eq!(template.root().text(), Some("x"));
    }

    #[test]
    fn test_copy_is_independent() {
        let source = base();
        let mut copy = source.copy();
        copy.apply(&Context::new().with("title", "changed")).unwrap();

        assert_eq!(source.root().serialize(false), "<div id=\"main\"></div>");
        assert_eq!(source.transforms().len(), 1);
        assert_eq!(copy.root().text(), Some("changed"));
    }

    fn add_late_span(doc: &mut Document, _: &Context) -> Result<()> {
        doc.insert("div", &Element::new("span").with_attr("class", "late").into())?;
        Ok(())
    }

    #[test]
    fn test_transforms_run_in_order() {
        let template = Template::new(Element::new("div"))
            .with_transform(Transform::new(["x"], add_late_span))
            .with_transform(Transform::new(["x"], set_text(".late", from_key("x"))));
        let html = template.render(&Context::new().with("x", "v")).unwrap();
        assert_eq!(html, "<div>\n  <span class=\"late\">v</span>\n</div>\n");
    }

    #[test]
    fn test_unmatched_insert_propagates() {
        // Reversed order: the span does not exist yet when insert runs.
        let template = Template::new(Element::new("div"))
            .with_transform(Transform::new(["x"], insert(".late", node_from_key("x"))))
            .with_transform(Transform::new(["x"], add_late_span));
        let err = template
            .render(&Context::new().with("x", "v"))
            .unwrap_err();
        assert!(matches!(err, Error::Markup(MarkupError::NoMatch(_))));
    }

    #[test]
    fn test_failed_transform_is_not_retired() {
        let mut template = Template::new(Element::new("div")).with_transform(Transform::new(
            ["x"],
            insert("#missing", node_from_key("x")),
        ));
        assert!(template.apply(&Context::new().with("x", "v")).is_err());
        assert_eq!(template.transforms().len(), 1);
        assert!(!template.transforms()[0].is_fired());
        assert!(template.keys().is_empty());

        // Retried on the next pass even without new input.
        assert!(template.apply(&Context::new()).is_err());
        assert_eq!(template.transforms().len(), 1);
    }

    #[test]
    fn test_earlier_transforms_keep_their_effect_on_error() {
        let mut template = base().with_transform(Transform::new(
            ["title"],
            insert("#missing", node_from_key("title")),
        ));
        assert!(template.apply(&Context::new().with("title", "kept")).is_err());
        assert_eq!(template.root().text(), Some("kept"));
        assert_eq!(template.transforms().len(), 1);
    }

    #[test]
    fn test_unmatched_set_text_renders() {
        let template = Template::new(Element::new("div").with_attr("id", "main"))
            .with_transform(Transform::new(["title"], set_text("h1", from_key("title"))));
        let html = template
            .render(&Context::new().with("title", "Hello"))
            .unwrap();
        assert_eq!(html, "<div id=\"main\"></div>\n");
    }

    #[test]
    fn test_render_report_lists_pending() {
        let template = base().with_transform(
            Transform::new(["a", "b"], |_: &mut Document, _: &Context| Ok(())).with_label("pair"),
        );
        let report = template
            .render_report(&Context::new().with("a", "1").with("title", "T"))
            .unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.fired, vec!["title".to_string()]);
        assert_eq!(
            report.pending,
            vec![PendingTransform {
                label: "pair".to_string(),
                missing: vec!["b".to_string()],
            }]
        );
        assert_eq!(report.markup(false), "<div id=\"main\">T</div>");
    }

    #[test]
    fn test_keys() {
        let template = base();
        assert_eq!(template.keys().into_iter().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn test_template_as_slot() {
        let value = base()
            .produce(&Context::new().with("title", "nested"))
            .unwrap();
        match value {
            Value::Markup(el) => assert_eq!(el.text(), Some("nested")),
            other => panic!("expected markup, got {:?}", other),
        }
    }
}
