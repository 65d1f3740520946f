//! Event routing tables owned by the runtime.

use std::collections::{BTreeSet, HashMap};

/// Identity of one mount. A remounted element gets a fresh slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SlotId(pub(crate) u64);

/// Where a named event comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Channel {
    /// Pushed by the server over the host bus.
    Server,
    /// Dispatched on the page's window, such as navigation signals.
    Window,
}

#[derive(Default)]
pub(crate) struct Subscriptions {
    routes: HashMap<(Channel, String), BTreeSet<SlotId>>,
}

impl Subscriptions {
    pub(crate) fn subscribe(&mut self, channel: Channel, name: String, view: SlotId) {
        self.routes
            .entry((channel, name))
            .or_default()
            .insert(view);
    }

    pub(crate) fn unsubscribe(&mut self, channel: Channel, name: &str, view: SlotId) {
        let key = (channel, name.to_owned());
        if let Some(views) = self.routes.get_mut(&key) {
            views.remove(&view);
            if views.is_empty() {
                self.routes.remove(&key);
            }
        }
    }

    /// Slots subscribed to `name`, in mount order.
    pub(crate) fn subscribers(&self, channel: Channel, name: &str) -> Vec<SlotId> {
        self.routes
            .get(&(channel, name.to_owned()))
            .map(|views| views.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn remove_slot(&mut self, view: SlotId) {
        self.routes.retain(|_, views| {
            views.remove(&view);
            !views.is_empty()
        });
    }

    pub(crate) fn count_for(&self, view: SlotId) -> usize {
        self.routes
            .values()
            .filter(|views| views.contains(&view))
            .count()
    }
}

struct Observer {
    threshold: f64,
    intersecting: bool,
}

/// Intersection observers, one per view at most.
///
/// Hosts may report ratios as often as they like; only threshold crossings
/// come out.
#[derive(Default)]
pub(crate) struct VisibilityObservers {
    observers: HashMap<SlotId, Observer>,
}

impl VisibilityObservers {
    pub(crate) fn observe(&mut self, view: SlotId, threshold: f64) {
        self.observers.insert(
            view,
            Observer {
                threshold,
                intersecting: false,
            },
        );
    }

    pub(crate) fn disconnect(&mut self, view: SlotId) {
        self.observers.remove(&view);
    }

    pub(crate) fn is_observing(&self, view: SlotId) -> bool {
        self.observers.contains_key(&view)
    }

    /// Record a new intersection ratio. Returns the new visibility on a
    /// crossing, `None` otherwise.
    pub(crate) fn report(&mut self, view: SlotId, ratio: f64) -> Option<bool> {
        let observer = self.observers.get_mut(&view)?;
        let intersecting = ratio >= observer.threshold;
        if intersecting == observer.intersecting {
            return None;
        }
        observer.intersecting = intersecting;
        Some(intersecting)
    }
}
