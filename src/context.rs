//! Input maps handed to templates at render and extend time.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::markup::{Element, Node};

/// A single input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Plain text
    Text(String),
    /// An unserialized tree, usually the output of another template
    Markup(Element),
    /// Structured data, e.g. decoded from JSON input
    Data(serde_json::Value),
    /// A nested input map, e.g. produced by a sub-template
    Map(Context),
}

impl Value {
    /// Text form of the value; markup is serialized compactly and JSON
    /// strings are taken without quotes.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Markup(el) => el.serialize(false),
            Value::Data(serde_json::Value::String(s)) => s.clone(),
            Value::Data(other) => other.to_string(),
            Value::Map(map) => map.to_json().to_string(),
        }
    }

    /// Node form of the value: markup stays a tree, everything else becomes text.
    pub fn to_node(&self) -> Node {
        match self {
            Value::Markup(el) => Node::Element(el.clone()),
            other => Node::Text(other.to_text()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Markup(el) => serde_json::Value::String(el.serialize(false)),
            Value::Data(data) => data.clone(),
            Value::Map(map) => map.to_json(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Element> for Value {
    fn from(el: Element) -> Self {
        Value::Markup(el)
    }
}

impl From<Context> for Value {
    fn from(map: Context) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        match data {
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Data(other),
        }
    }
}

/// Ordered map of input keys to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a key that must be present.
    ///
    /// # Errors
    /// * `Error::MissingKey` if the key is absent
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
        })
    }

    /// Reads a textual value.
    ///
    /// # Errors
    /// * `Error::MissingKey` if the key is absent
    /// * `Error::ValueType` if the value is not text
    pub fn text(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            Value::Text(s) => Ok(s.as_str()),
            Value::Data(serde_json::Value::String(s)) => Ok(s.as_str()),
            _ => Err(Error::ValueType {
                key: key.to_string(),
                expected: "text",
            }),
        }
    }

    /// Reads a markup tree value.
    ///
    /// # Errors
    /// * `Error::MissingKey` if the key is absent
    /// * `Error::ValueType` if the value is not markup
    pub fn markup(&self, key: &str) -> Result<&Element> {
        match self.require(key)? {
            Value::Markup(el) => Ok(el),
            _ => Err(Error::ValueType {
                key: key.to_string(),
                expected: "markup",
            }),
        }
    }

    /// Reads a nested input map.
    ///
    /// # Errors
    /// * `Error::MissingKey` if the key is absent
    /// * `Error::ValueType` if the value is not a map
    pub fn map(&self, key: &str) -> Result<&Context> {
        match self.require(key)? {
            Value::Map(map) => Ok(map),
            _ => Err(Error::ValueType {
                key: key.to_string(),
                expected: "a map",
            }),
        }
    }

    /// Builds a context from a JSON object; strings become text values.
    ///
    /// # Errors
    /// * `Error::ConfigError` if `data` is not an object
    pub fn from_json(data: serde_json::Value) -> Result<Self> {
        match data {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            serde_json::Value::Null => Ok(Self::new()),
            other => Err(Error::ConfigError(format!(
                "input must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_reads() {
        let ctx = Context::new()
            .with("title", "Hello")
            .with("body", Element::new("p").with_text("x"))
            .with("count", json!(3));

        assert_eq!(ctx.text("title").unwrap(), "Hello");
        assert_eq!(ctx.markup("body").unwrap().tag(), "p");
        assert!(matches!(
            ctx.text("body"),
            Err(Error::ValueType { expected: "text", .. })
        ));
        assert!(matches!(ctx.markup("nope"), Err(Error::MissingKey { .. })));
        assert_eq!(ctx.require("count").unwrap().to_text(), "3");
    }

    #[test]
    fn test_from_json() {
        let ctx = Context::from_json(json!({"title": "Hi", "n": 1, "tags": ["a"]})).unwrap();
        assert_eq!(ctx.get("title"), Some(&Value::Text("Hi".to_string())));
        assert_eq!(ctx.get("n"), Some(&Value::Data(json!(1))));
        assert_eq!(ctx.len(), 3);

        assert!(Context::from_json(json!(null)).unwrap().is_empty());
        assert!(Context::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_markup_value_as_text_and_json() {
        let value = Value::from(Element::new("b").with_text("x"));
        assert_eq!(value.to_text(), "<b>x</b>");
        assert_eq!(value.to_json(), json!("<b>x</b>"));
    }

    #[test]
    fn test_nested_map() {
        let inner = Context::new().with("title", "Hi");
        let ctx = Context::new().with("header", inner.clone());
        assert_eq!(ctx.map("header").unwrap(), &inner);
        assert_eq!(ctx.to_json(), json!({"header": {"title": "Hi"}}));
        assert!(ctx.text("header").is_err());
    }
}
