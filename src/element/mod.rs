//! The DOM seam: what hooks may ask of the element they are mounted on.
//!
//! The embedding host implements these traits over its real document (for
//! example through `web-sys`). The `testing` feature ships an in-memory
//! implementation in [`fake`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "testing"))]
pub mod fake;

/// Identifier of a mounted view, taken from its element's DOM id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Object identity of a DOM node.
///
/// Two handles to the same node report the same `NodeId`; a node that was
/// replaced by an identical copy reports a different one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// The element a hook is mounted on.
pub trait ViewElement {
    /// The element's DOM id.
    fn id(&self) -> ViewId;

    /// Value of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<String>;

    /// The first `<svg>` descendant, if any.
    fn svg(&self) -> Option<Box<dyn SvgNode>>;

    /// Append an empty child container and return it.
    fn append_container(&mut self) -> Arc<dyn Container>;

    /// Whether the element's bounding box lies entirely inside the viewport.
    fn is_fully_in_viewport(&self) -> bool;
}

/// An `<svg>` subtree.
pub trait SvgNode {
    fn node_id(&self) -> NodeId;

    /// Serialized markup of the subtree, used for by-value comparison.
    fn outer_html(&self) -> String;

    /// Descendants matching a CSS selector.
    fn query_all(&self, selector: &str) -> Vec<Box<dyn InteractiveElement>>;
}

/// An element inside a rendered SVG that can receive click listeners.
pub trait InteractiveElement {
    fn add_click_listener(&self, listener: &Listener);

    /// Removes `listener` if it is the same listener that was added.
    fn remove_click_listener(&self, listener: &Listener);
}

/// A child container handed to a rendering library.
pub trait Container: Send + Sync {
    fn is_empty(&self) -> bool;

    /// Remove everything rendered into the container.
    fn clear(&self);
}

/// Click listener with stable identity.
///
/// Clones share identity, so the value stored at binding time can be used to
/// remove exactly the listener that was attached.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(Dataset) + Send + Sync>);

impl Listener {
    pub fn new(callback: impl Fn(Dataset) + Send + Sync + 'static) -> Self {
        Self(Arc::new(callback))
    }

    /// Invoke the listener with the clicked element's dataset.
    pub fn call(&self, dataset: Dataset) {
        (self.0)(dataset)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// The `data-*` attributes of an element, keyed like the DOM `dataset`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(BTreeMap<String, String>);

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from raw attributes, keeping only `data-*` ones.
    ///
    /// Names are converted the way browsers do: the `data-` prefix is
    /// dropped and every `-` followed by a lowercase ASCII letter becomes the
    /// uppercase letter (`data-series-name` → `seriesName`).
    pub fn from_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        attributes
            .into_iter()
            .filter_map(|(name, value)| {
                name.strip_prefix("data-")
                    .map(|key| (camel_case(key), value.to_owned()))
            })
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Dataset {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(next) if c == '-' && next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
