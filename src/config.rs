//! Declarative template files.
//! A template file describes a root element, the transforms waiting on it and,
//! for derived templates, the base it `extends` plus the slots it fills in.
//! Files may be JSON or YAML.
//!
//! ```yaml
//! root:
//!   tag: div#main
//! transforms:
//!   - action: set_text
//!     path: "#main"
//!     keys: title
//!     content: "{{ title }}!"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::actions::{from_key, insert, node_from_key, replace, set_attr, set_text};
use crate::context::{Context, Value};
use crate::error::{Error, Result};
use crate::markup::{parse_selector, validate_name, Element, Node};
use crate::renderer::{expression, ContentRenderer};
use crate::subtemplate::SubTemplate;
use crate::template::Template;
use crate::transform::Transform;

/// Template file names looked up inside a directory
pub const CONFIG_FILES: [&str; 3] = ["wiseguy.json", "wiseguy.yml", "wiseguy.yaml"];

/// A child node: a bare string is text, a mapping is an element.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeConfig {
    Text(String),
    Element(ElementConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementConfig {
    /// Tag name, optionally with id and classes: `section#intro.wide`
    pub tag: String,
    #[serde(default)]
    pub attrs: IndexMap<String, String>,
    /// Leading text
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeConfig>,
}

impl ElementConfig {
    /// # Errors
    /// * `Error::Markup` if the tag or an attribute name is not a valid name
    pub fn to_element(&self) -> Result<Element> {
        let mut el = Element::from_shorthand(&self.tag)?;
        for (name, value) in &self.attrs {
            validate_name(name)?;
            el.set_attribute(name.clone(), value.clone());
        }
        if let Some(text) = &self.text {
            el.append(Node::text(text.clone()));
        }
        for child in &self.children {
            let node = match child {
                NodeConfig::Text(text) => Node::text(text.clone()),
                NodeConfig::Element(inner) => Node::Element(inner.to_element()?),
            };
            el.append(node);
        }
        Ok(el)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SetAttr,
    SetText,
    Replace,
    Insert,
}

/// One key or a list of keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Keys {
    One(String),
    Many(Vec<String>),
}

impl Keys {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Keys::One(key) => vec![key.clone()],
            Keys::Many(keys) => keys.clone(),
        }
    }
}

impl Default for Keys {
    fn default() -> Self {
        Keys::Many(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    pub action: ActionKind,
    pub path: String,
    /// Attribute name, required by `set_attr`
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub keys: Keys,
    /// MiniJinja expression; defaults to the value of the single key
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Base template file, relative to this file
    #[serde(default)]
    pub extends: Option<PathBuf>,
    #[serde(default)]
    pub root: Option<ElementConfig>,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
    /// Slot name to MiniJinja expression, evaluated when extending
    #[serde(default)]
    pub slots: IndexMap<String, String>,
}

/// Locates a template file.
///
/// `path` may name a file directly or a directory containing one of
/// `config_files`.
///
/// # Errors
/// * `Error::ConfigError` if no template file exists
pub fn find_config<P: AsRef<Path>>(path: P, config_files: &[&str]) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        for file in config_files {
            let config_path = path.join(file);
            if config_path.exists() {
                return Ok(config_path);
            }
        }
    }

    Err(Error::ConfigError(format!(
        "No template file found at {} (tried: {})",
        path.display(),
        config_files.join(", ")
    )))
}

/// Parses template file content, trying JSON first and YAML second.
///
/// # Errors
/// * `Error::ConfigError` if the content is neither valid JSON nor YAML
///   for a template file
pub fn parse_config(content: &str) -> Result<TemplateConfig> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid template file: {}", e))),
    }
}

/// Builds a transform from its declaration.
///
/// # Errors
/// * `Error::Markup` if the path is not a valid selector or the `set_attr`
///   attribute is not a valid name
/// * `Error::ConfigError` if `set_attr` lacks `attr`, or if `content` is
///   missing while the transform does not have exactly one key
pub fn build_transform(
    config: &TransformConfig,
    renderer: &Arc<dyn ContentRenderer>,
) -> Result<Transform> {
    parse_selector(&config.path)?;
    let keys = config.keys.to_vec();
    let text_content: Box<dyn Fn(&Context) -> Result<String> + Send + Sync> =
        match (&config.content, keys.as_slice()) {
            (Some(expr), _) => Box::new(expression(Arc::clone(renderer), expr.clone())),
            (None, [key]) => Box::new(from_key(key.clone())),
            (None, _) => {
                return Err(Error::ConfigError(format!(
                    "transform on '{}' needs `content` unless it has exactly one key",
                    config.path
                )))
            }
        };
    // Without an expression a markup input is placed as a tree, not as text.
    let single_key = match &config.content {
        Some(_) => None,
        None => keys.first().cloned(),
    };

    let path = config.path.clone();
    let transform = match config.action {
        ActionKind::SetText => Transform::new(keys, set_text(path, text_content)),
        ActionKind::SetAttr => {
            let attr = config.attr.clone().ok_or_else(|| {
                Error::ConfigError(format!("set_attr on '{}' needs `attr`", config.path))
            })?;
            validate_name(&attr)?;
            Transform::new(keys, set_attr(path, attr, text_content))
        }
        ActionKind::Replace | ActionKind::Insert => {
            let content: Box<dyn Fn(&Context) -> Result<Node> + Send + Sync> = match &single_key {
                Some(key) => Box::new(node_from_key(key.clone())),
                None => Box::new(move |ctx: &Context| Ok(Node::Text(text_content(ctx)?))),
            };
            if config.action == ActionKind::Replace {
                Transform::new(keys, replace(path, content))
            } else {
                Transform::new(keys, insert(path, content))
            }
        }
    };

    Ok(match &config.label {
        Some(label) => transform.with_label(label.clone()),
        None => transform,
    })
}

/// Builds the overlay a derived template file contributes to its base.
pub fn build_overlay(
    config: &TemplateConfig,
    renderer: &Arc<dyn ContentRenderer>,
) -> Result<SubTemplate> {
    let mut overlay = SubTemplate::new();
    for (name, expr) in &config.slots {
        let content = expression(Arc::clone(renderer), expr.clone());
        overlay = overlay.slot(name.clone(), move |ctx: &Context| {
            Ok(Value::Text(content(ctx)?))
        });
    }
    for transform in &config.transforms {
        overlay = overlay.with_transform(build_transform(transform, renderer)?);
    }
    Ok(overlay)
}

/// Builds a template from a parsed file, given its already built base when
/// the file `extends` one.
///
/// # Errors
/// * `Error::ConfigError` if the file mixes `root` with `extends`, has
///   neither, or declares slots without a base
pub fn build_template(
    config: &TemplateConfig,
    base: Option<&Template>,
    renderer: &Arc<dyn ContentRenderer>,
) -> Result<Template> {
    match (base, &config.root) {
        (Some(base), None) => base.extend(&build_overlay(config, renderer)?),
        (None, Some(root)) => {
            if !config.slots.is_empty() {
                return Err(Error::ConfigError(
                    "`slots` are only allowed in a template that extends another".to_string(),
                ));
            }
            let mut template = Template::new(root.to_element()?);
            for transform in &config.transforms {
                template = template.with_transform(build_transform(transform, renderer)?);
            }
            Ok(template)
        }
        (Some(_), Some(_)) => Err(Error::ConfigError(
            "a template that extends another cannot declare its own `root`".to_string(),
        )),
        (None, None) => Err(Error::ConfigError(
            "template file needs either `root` or `extends`".to_string(),
        )),
    }
}

/// Loads a template file, following `extends` chains.
///
/// # Errors
/// * `Error::IoError` if a file cannot be read
/// * `Error::ConfigError` for malformed files and circular `extends` chains
pub fn load_template<P: AsRef<Path>>(
    path: P,
    renderer: &Arc<dyn ContentRenderer>,
) -> Result<Template> {
    let mut chain = Vec::new();
    load_chained(path.as_ref(), renderer, &mut chain)
}

fn load_chained(
    path: &Path,
    renderer: &Arc<dyn ContentRenderer>,
    chain: &mut Vec<PathBuf>,
) -> Result<Template> {
    let path = find_config(path, &CONFIG_FILES)?;
    let canonical = path.canonicalize().map_err(Error::IoError)?;
    if chain.contains(&canonical) {
        let names: Vec<String> = chain
            .iter()
            .chain(std::iter::once(&canonical))
            .map(|p| p.display().to_string())
            .collect();
        return Err(Error::ConfigError(format!(
            "circular extends: {}",
            names.join(" -> ")
        )));
    }

    debug!("Loading template from {}", path.display());
    let content = std::fs::read_to_string(&path).map_err(Error::IoError)?;
    let config = parse_config(&content)?;

    let base = match &config.extends {
        Some(base_path) => {
            let base_path = path
                .parent()
                .map(|dir| dir.join(base_path))
                .unwrap_or_else(|| base_path.clone());
            chain.push(canonical);
            let base = load_chained(&base_path, renderer, chain)?;
            chain.pop();
            Some(base)
        }
        None => None,
    };

    build_template(&config, base.as_ref(), renderer)
}
