//! Standard action builders.
//!
//! Each builder pairs a selector path with a content function and returns an
//! action suitable for [`Transform::new`](crate::transform::Transform::new).
//! Text and attribute builders take `Fn(&Context) -> Result<String>`;
//! `replace` and `insert` take `Fn(&Context) -> Result<Node>`.

use crate::context::Context;
use crate::error::Result;
use crate::markup::{Document, Markup, Node};

/// Sets `attr` on every element matched by `path`.
pub fn set_attr<P, A, F>(
    path: P,
    attr: A,
    content: F,
) -> impl Fn(&mut Document, &Context) -> Result<()> + Send + Sync + 'static
where
    P: Into<String>,
    A: Into<String>,
    F: Fn(&Context) -> Result<String> + Send + Sync + 'static,
{
    let path = path.into();
    let attr = attr.into();
    move |root: &mut Document, ctx: &Context| {
        let value = content(ctx)?;
        root.set_attr(&path, &attr, &value)?;
        Ok(())
    }
}

/// Sets the text of every element matched by `path`; matching nothing
/// leaves the tree as it is.
pub fn set_text<P, F>(
    path: P,
    content: F,
) -> impl Fn(&mut Document, &Context) -> Result<()> + Send + Sync + 'static
where
    P: Into<String>,
    F: Fn(&Context) -> Result<String> + Send + Sync + 'static,
{
    let path = path.into();
    move |root: &mut Document, ctx: &Context| {
        let text = content(ctx)?;
        root.set_text(&path, &text)?;
        Ok(())
    }
}

/// Replaces every element matched by `path` with the produced node.
pub fn replace<P, F>(
    path: P,
    content: F,
) -> impl Fn(&mut Document, &Context) -> Result<()> + Send + Sync + 'static
where
    P: Into<String>,
    F: Fn(&Context) -> Result<Node> + Send + Sync + 'static,
{
    let path = path.into();
    move |root: &mut Document, ctx: &Context| {
        let node = content(ctx)?;
        root.replace(&path, &node)?;
        Ok(())
    }
}

/// Makes the produced node the content of every element matched by `path`.
pub fn insert<P, F>(
    path: P,
    content: F,
) -> impl Fn(&mut Document, &Context) -> Result<()> + Send + Sync + 'static
where
    P: Into<String>,
    F: Fn(&Context) -> Result<Node> + Send + Sync + 'static,
{
    let path = path.into();
    move |root: &mut Document, ctx: &Context| {
        let node = content(ctx)?;
        root.insert(&path, &node)?;
        Ok(())
    }
}

/// Content function yielding the text form of one input.
pub fn from_key<S: Into<String>>(
    key: S,
) -> impl Fn(&Context) -> Result<String> + Send + Sync + 'static {
    let key = key.into();
    move |ctx: &Context| Ok(ctx.require(&key)?.to_text())
}

/// Content function yielding one input as a node; markup inputs stay trees.
pub fn node_from_key<S: Into<String>>(
    key: S,
) -> impl Fn(&Context) -> Result<Node> + Send + Sync + 'static {
    let key = key.into();
    move |ctx: &Context| Ok(ctx.require(&key)?.to_node())
}
