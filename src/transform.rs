//! Deferred tree mutations gated on named inputs.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::markup::Document;

/// Mutation run against a template's root once every required key is known.
pub type Action = Arc<dyn Fn(&mut Document, &Context) -> Result<()> + Send + Sync>;

/// A single deferred mutation.
///
/// The set of pending keys only ever shrinks. Once it is empty the transform
/// is ready; it counts as fired only after its action has run successfully,
/// and never runs again afterwards. A transform whose keys never all arrive
/// simply stays pending.
#[derive(Clone)]
pub struct Transform {
    label: String,
    keys: BTreeSet<String>,
    bound: Context,
    pending: BTreeSet<String>,
    resolved: Context,
    action: Action,
    fired: bool,
}

impl Transform {
    /// Creates a transform requiring `keys` before `action` may run.
    pub fn new<I, S, F>(keys: I, action: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&mut Document, &Context) -> Result<()> + Send + Sync + 'static,
    {
        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        let label = keys.iter().cloned().collect::<Vec<_>>().join(",");
        Self {
            label,
            pending: keys.clone(),
            keys,
            bound: Context::new(),
            resolved: Context::new(),
            action: Arc::new(action),
            fired: false,
        }
    }

    /// Names the transform in reports and logs.
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Every key the transform was declared with.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keys still waiting for a value.
    pub fn pending_keys(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Values captured so far.
    pub fn resolved(&self) -> &Context {
        &self.resolved
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Captures every pending key present in `input`.
    ///
    /// A key that is already resolved is never looked up again, so the first
    /// value wins. Returns whether the transform is ready to run: every key
    /// is resolved and it has not fired yet.
    pub fn apply(&mut self, input: &Context) -> bool {
        if self.fired {
            return false;
        }
        let found: Vec<String> = self
            .pending
            .iter()
            .filter(|key| input.contains_key(key))
            .cloned()
            .collect();
        for key in found {
            if let Some(value) = input.get(&key) {
                self.resolved.insert(key.clone(), value.clone());
            }
            self.pending.remove(&key);
        }
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        !self.fired && self.pending.is_empty()
    }

    /// Runs the action against `doc` with the captured values and marks the
    /// transform fired. A failed action leaves it ready for another attempt.
    pub fn run(&mut self, doc: &mut Document) -> Result<()> {
        (self.action)(doc, &self.resolved)?;
        self.fired = true;
        Ok(())
    }

    /// A copy of this transform as originally defined, with all progress made
    /// since definition discarded.
    pub fn reset(&self) -> Self {
        let pending = self
            .keys
            .iter()
            .filter(|key| !self.bound.contains_key(key))
            .cloned()
            .collect();
        Self {
            label: self.label.clone(),
            keys: self.keys.clone(),
            bound: self.bound.clone(),
            pending,
            resolved: self.bound.clone(),
            action: Arc::clone(&self.action),
            fired: false,
        }
    }

    /// Makes the values captured so far part of the definition, so they
    /// survive later resets.
    pub fn bind(&mut self) {
        self.bound = self.resolved.clone();
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("label", &self.label)
            .field("keys", &self.keys)
            .field("pending", &self.pending)
            .field("fired", &self.fired)
            .finish()
    }
}
