//! Named collections of templates.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::template::Template;

/// Called with the name and entry of every successful registration.
pub type RegisterHook<T> = Arc<dyn Fn(&str, &T) + Send + Sync>;

/// An ordered collection of uniquely named entries.
#[derive(Clone)]
pub struct Registry<T> {
    entries: IndexMap<String, T>,
    hook: Option<RegisterHook<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            hook: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a hook run once for each entry registered from now on,
    /// e.g. to index templates as they are defined.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &T) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Stores `entry` under `name` and hands back a reference to it.
    ///
    /// # Errors
    /// * `Error::DuplicateTemplate` if `name` is already taken
    pub fn register<S: Into<String>>(&mut self, name: S, entry: T) -> Result<&T> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(Error::DuplicateTemplate { name });
        }
        debug!("Registering '{}'", name);
        if let Some(hook) = &self.hook {
            hook(&name, &entry);
        }
        let (index, _) = self.entries.insert_full(name, entry);
        Ok(&self.entries[index])
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Registry<Template> {
    /// Looks up `name` and renders it with `input`.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` if nothing is registered under `name`
    pub fn render(&self, name: &str, input: &Context) -> Result<String> {
        self.get(name)
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })?
            .render(input)
    }
}

/// Builds a template definition with `define` and registers it under `name`.
///
/// The name is checked first, so `define` never runs for a name that is
/// already taken. This is the only point where a definition enters a
/// registry; rendering it later has no registration cost.
///
/// # Errors
/// * `Error::DuplicateTemplate` if `name` is already taken
/// * any error returned by `define`
pub fn register_template<'a, S, F>(
    registry: &'a mut Registry<Template>,
    name: S,
    define: F,
) -> Result<&'a Template>
where
    S: Into<String>,
    F: FnOnce() -> Result<Template>,
{
    let name = name.into();
    if registry.contains(&name) {
        return Err(Error::DuplicateTemplate { name });
    }
    let template = define()?;
    registry.register(name, template)
}
