//! Named slot collections used as nested inputs and as `extend` overlays.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::{Context, Value};
use crate::error::Result;
use crate::template::Template;
use crate::transform::Transform;

/// Something that produces a value from an input map.
///
/// Closures `Fn(&Context) -> Result<Value>` are slots, and so is a
/// [`Template`], which produces its rendered tree.
pub trait Slot: Send + Sync {
    fn produce(&self, input: &Context) -> Result<Value>;

    /// Transforms contributed to an overlay that holds this slot.
    fn exposed_transforms(&self) -> Vec<Transform> {
        Vec::new()
    }
}

impl<F> Slot for F
where
    F: Fn(&Context) -> Result<Value> + Send + Sync,
{
    fn produce(&self, input: &Context) -> Result<Value> {
        self(input)
    }
}

/// The override side of [`Template::extend`].
pub trait Overlay {
    /// Transforms appended after the base template's own.
    fn overlay_transforms(&self) -> Vec<Transform>;

    /// Values for the base template's pending keys.
    fn slots(&self, input: &Context) -> Result<Context>;
}

/// A set of named slots evaluated together.
///
/// Every call evaluates every slot; nothing is cached between calls.
#[derive(Clone, Default)]
pub struct SubTemplate {
    slots: IndexMap<String, Arc<dyn Slot>>,
    transforms: Vec<Transform>,
}

impl SubTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot computed from the input map.
    pub fn slot<S, F>(mut self, name: S, slot: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.slots.insert(name.into(), Arc::new(slot));
        self
    }

    /// Adds a slot that always yields `value`.
    pub fn value<S: Into<String>, V: Into<Value>>(self, name: S, value: V) -> Self {
        let value = value.into();
        self.slot(name, move |_: &Context| Ok(value.clone()))
    }

    /// Adds a nested template; it yields its rendered tree and exposes its
    /// transforms to overlays.
    pub fn template<S: Into<String>>(mut self, name: S, template: Template) -> Self {
        self.slots.insert(name.into(), Arc::new(template));
        self
    }

    /// Adds an override transform of its own.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Slot names in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Evaluates every slot against `input`.
    pub fn call(&self, input: &Context) -> Result<Context> {
        let mut out = Context::new();
        for (name, slot) in &self.slots {
            out.insert(name.clone(), slot.produce(input)?);
        }
        Ok(out)
    }

    /// Own transforms followed by those of every nested template, in slot order.
    pub fn transforms(&self) -> Vec<Transform> {
        let mut all = self.transforms.clone();
        for slot in self.slots.values() {
            all.extend(slot.exposed_transforms());
        }
        all
    }
}

impl Slot for SubTemplate {
    fn produce(&self, input: &Context) -> Result<Value> {
        Ok(Value::Map(self.call(input)?))
    }

    fn exposed_transforms(&self) -> Vec<Transform> {
        self.transforms()
    }
}

impl Overlay for SubTemplate {
    fn overlay_transforms(&self) -> Vec<Transform> {
        self.transforms()
    }

    fn slots(&self, input: &Context) -> Result<Context> {
        self.call(input)
    }
}

impl fmt::Debug for SubTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTemplate")
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .field("transforms", &self.transforms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{from_key, set_attr};
    use crate::markup::{Document, Element};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_call_evaluates_every_slot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = SubTemplate::new()
            .value("title", "Hello")
            .slot("greeting", move |ctx: &Context| {
                counter.fetch_add(1, Ordering::SeqCst);
                let name = ctx.text("name").unwrap_or("stranger");
                Ok(Value::from(format!("Hi {}", name)))
            });

        assert_eq!(sub.keys().collect::<Vec<_>>(), vec!["title", "greeting"]);

        let out = sub.call(&Context::new().with("name", "Lister")).unwrap();
        assert_eq!(out.text("title").unwrap(), "Hello");
        assert_eq!(out.text("greeting").unwrap(), "Hi Lister");

        let out = sub.call(&Context::new()).unwrap();
        assert_eq!(out.text("greeting").unwrap(), "Hi stranger");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_nested_template_slot() {
        let nav = Template::new(Element::new("a").with_attr("class", "home")).with_transform(
            Transform::new(["url"], set_attr("a", "href", from_key("url"))),
        );
        let sub = SubTemplate::new()
            .template("nav", nav)
            .with_transform(Transform::new(["x"], |_: &mut Document, _: &Context| Ok(())));

        let out = sub.call(&Context::new().with("url", "/home")).unwrap();
        assert_eq!(out.markup("nav").unwrap().attr("href"), Some("/home"));

        let labels: Vec<String> = sub
            .transforms()
            .iter()
            .map(|t| t.label().to_string())
            .collect();
        assert_eq!(labels, vec!["x".to_string(), "url".to_string()]);
    }

    #[test]
    fn test_subtemplate_as_nested_value() {
        let inner = SubTemplate::new().value("a", "1");
        let outer = SubTemplate::new().slot("inner", move |ctx: &Context| inner.produce(ctx));
        let out = outer.call(&Context::new()).unwrap();
        assert_eq!(out.map("inner").unwrap().text("a").unwrap(), "1");
    }
}
