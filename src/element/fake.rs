//! In-memory DOM used by tests.
//!
//! Only available with the `testing` feature. Every fake is a cheap handle
//! over shared state: keep a clone after handing one to the runtime and use
//! it to mutate the document or inspect what hooks did to it.

use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;

use portable_atomic_util::Arc;
use spin::Mutex;

use super::{Container, Dataset, InteractiveElement, Listener, NodeId, SvgNode, ViewElement, ViewId};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

struct ElementState {
    id: ViewId,
    attributes: BTreeMap<String, String>,
    svg: Option<FakeSvg>,
    containers: Vec<FakeContainer>,
    in_viewport: bool,
}

/// A fake host element.
///
/// # Example
///
/// ```rust
/// use oxide_hooks::element::fake::{FakeDataPoint, FakeElement, FakeSvg};
///
/// let point = FakeDataPoint::new([("class", "data-point"), ("data-foo", "bar")]);
/// let element = FakeElement::new("revenue")
///     .with_svg(FakeSvg::new("<svg><circle/></svg>", vec![point.clone()]));
///
/// assert!(element.has_svg());
/// assert_eq!(point.listener_count(), 0);
/// ```
#[derive(Clone)]
pub struct FakeElement {
    state: Arc<Mutex<ElementState>>,
}

impl FakeElement {
    /// An element with the given DOM id, fully inside the viewport.
    pub fn new(id: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(ElementState {
                id: ViewId::new(id),
                attributes: BTreeMap::new(),
                svg: None,
                containers: Vec::new(),
                in_viewport: true,
            })),
        }
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_svg(self, svg: FakeSvg) -> Self {
        self.set_svg(Some(svg));
        self
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .lock()
            .attributes
            .insert(name.to_owned(), value.to_owned());
    }

    /// Replace (or remove) the element's SVG subtree.
    pub fn set_svg(&self, svg: Option<FakeSvg>) {
        self.state.lock().svg = svg;
    }

    pub fn set_in_viewport(&self, in_viewport: bool) {
        self.state.lock().in_viewport = in_viewport;
    }

    pub fn has_svg(&self) -> bool {
        self.state.lock().svg.is_some()
    }

    /// Containers appended by hooks, in creation order.
    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    /// Boxes a handle for [`HookRuntime::mount`](crate::HookRuntime::mount).
    pub fn boxed(&self) -> Box<dyn ViewElement> {
        Box::new(self.clone())
    }
}

impl ViewElement for FakeElement {
    fn id(&self) -> ViewId {
        self.state.lock().id.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.state.lock().attributes.get(name).cloned()
    }

    fn svg(&self) -> Option<Box<dyn SvgNode>> {
        self.state
            .lock()
            .svg
            .clone()
            .map(|svg| Box::new(svg) as Box<dyn SvgNode>)
    }

    fn append_container(&mut self) -> std::sync::Arc<dyn Container> {
        let container = FakeContainer::default();
        self.state.lock().containers.push(container.clone());
        std::sync::Arc::new(container)
    }

    fn is_fully_in_viewport(&self) -> bool {
        self.state.lock().in_viewport
    }
}

struct SvgState {
    node_id: NodeId,
    markup: String,
    points: Vec<FakeDataPoint>,
}

/// A fake `<svg>` node. Clones are the same node.
#[derive(Clone)]
pub struct FakeSvg {
    state: Arc<SvgState>,
}

impl FakeSvg {
    pub fn new(markup: &str, points: Vec<FakeDataPoint>) -> Self {
        Self {
            state: Arc::new(SvgState {
                node_id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
                markup: markup.to_owned(),
                points,
            }),
        }
    }

    /// A distinct node with identical markup and the given points.
    pub fn rerendered(&self, points: Vec<FakeDataPoint>) -> Self {
        Self::new(&self.state.markup, points)
    }
}

impl SvgNode for FakeSvg {
    fn node_id(&self) -> NodeId {
        self.state.node_id
    }

    fn outer_html(&self) -> String {
        self.state.markup.clone()
    }

    /// Supports class selectors (`.name`) only.
    fn query_all(&self, selector: &str) -> Vec<Box<dyn InteractiveElement>> {
        let Some(class) = selector.strip_prefix('.') else {
            return Vec::new();
        };
        self.state
            .points
            .iter()
            .filter(|point| point.has_class(class))
            .map(|point| Box::new(point.clone()) as Box<dyn InteractiveElement>)
            .collect()
    }
}

struct PointState {
    attributes: Vec<(String, String)>,
    listeners: Vec<Listener>,
}

/// A fake element inside an SVG.
#[derive(Clone)]
pub struct FakeDataPoint {
    state: Arc<Mutex<PointState>>,
}

impl FakeDataPoint {
    pub fn new<'a>(attributes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PointState {
                attributes: attributes
                    .into_iter()
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect(),
                listeners: Vec::new(),
            })),
        }
    }

    /// Dispatch a click to every attached listener.
    pub fn click(&self) {
        let (dataset, listeners) = {
            let state = self.state.lock();
            let dataset = Dataset::from_attributes(
                state
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
            (dataset, state.listeners.clone())
        };
        for listener in listeners {
            listener.call(dataset.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn has_class(&self, class: &str) -> bool {
        self.state
            .lock()
            .attributes
            .iter()
            .any(|(name, value)| name == "class" && value.split_whitespace().any(|c| c == class))
    }
}

impl InteractiveElement for FakeDataPoint {
    fn add_click_listener(&self, listener: &Listener) {
        let mut state = self.state.lock();
        // addEventListener ignores a listener that is already registered
        if !state.listeners.contains(listener) {
            state.listeners.push(listener.clone());
        }
    }

    fn remove_click_listener(&self, listener: &Listener) {
        self.state.lock().listeners.retain(|l| l != listener);
    }
}

/// A fake container appended by a hook.
#[derive(Clone)]
pub struct FakeContainer {
    children: Arc<Mutex<Vec<String>>>,
}

impl Default for FakeContainer {
    fn default() -> Self {
        Self {
            children: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeContainer {
    /// Used by fake renderers to draw into the container.
    pub fn render(&self, markup: &str) {
        self.children.lock().push(markup.to_owned());
    }

    pub fn children(&self) -> Vec<String> {
        self.children.lock().clone()
    }
}

impl Container for FakeContainer {
    fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }

    fn clear(&self) {
        self.children.lock().clear();
    }
}
