//! The view-hook contract and the context hooks act through.

use serde_json::Value;

use crate::bus::{HostBus, OutboundEvent};
use crate::effect::Effect;
use crate::element::{Dataset, Listener, ViewElement, ViewId};
use crate::emitter::{Emitter, Envelope};
use crate::error::{HookResult, RenderConstructionError};
use crate::render::SpecView;
use crate::routing::{Channel, SlotId, Subscriptions, VisibilityObservers};

/// Messages delivered back to a hook after it asked for them.
pub enum HookMessage {
    /// A listener created with [`HookContext::listener`] fired.
    DataPointClicked(Dataset),
    /// The view's visibility observer crossed its threshold.
    VisibilityChanged { visible: bool },
    /// The post-navigation settle delay elapsed.
    NavigationSettled,
    /// An asynchronous specification embed resolved.
    SpecSettled {
        ticket: u64,
        outcome: Result<Box<dyn SpecView>, RenderConstructionError>,
    },
}

/// Lifecycle contract for a hook bound to one element.
///
/// Hosts mount, update and destroy a view in that order, never concurrently.
/// The three lifecycle callbacks are required; named events and internal
/// messages are opt-in.
///
/// # Example
///
/// ```rust
/// use oxide_hooks::{Effect, HookContext, HookMessage, HookResult, ViewHook};
///
/// #[derive(Default)]
/// struct CountUpdates {
///     updates: u32,
/// }
///
/// impl ViewHook for CountUpdates {
///     fn mounted(&mut self, _ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
///         Ok(Effect::none())
///     }
///
///     fn updated(&mut self, _ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
///         self.updates += 1;
///         Ok(Effect::none())
///     }
///
///     fn destroyed(&mut self, _ctx: &mut HookContext<'_>) -> Effect<HookMessage> {
///         Effect::none()
///     }
/// }
/// ```
pub trait ViewHook {
    /// The element was inserted. Errors abort the mount.
    fn mounted(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>>;

    /// The server patched the element.
    fn updated(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>>;

    /// The element was removed. Release everything.
    fn destroyed(&mut self, ctx: &mut HookContext<'_>) -> Effect<HookMessage>;

    /// A named event this hook subscribed to arrived.
    fn handle_event(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _event: &str,
        _payload: &Value,
    ) -> HookResult<Effect<HookMessage>> {
        Ok(Effect::none())
    }

    /// A message produced by an effect or listener of this hook arrived.
    fn handle_message(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _message: HookMessage,
    ) -> Effect<HookMessage> {
        Effect::none()
    }

    /// `false` while work started by the hook still has to come back.
    ///
    /// A destroyed hook is kept alive until this returns `true`.
    fn is_settled(&self) -> bool {
        true
    }
}

/// What a hook may touch during one callback.
pub struct HookContext<'a> {
    pub(crate) view: &'a ViewId,
    pub(crate) slot: SlotId,
    pub(crate) element: &'a mut dyn ViewElement,
    pub(crate) bus: &'a dyn HostBus,
    pub(crate) emitter: &'a Emitter<Envelope>,
    pub(crate) subscriptions: &'a mut Subscriptions,
    pub(crate) observers: &'a mut VisibilityObservers,
}

impl<'a> HookContext<'a> {
    pub fn view_id(&self) -> &ViewId {
        self.view
    }

    pub fn element(&self) -> &dyn ViewElement {
        &*self.element
    }

    pub fn element_mut(&mut self) -> &mut dyn ViewElement {
        &mut *self.element
    }

    /// Route server events named `event` to this hook.
    pub fn subscribe(&mut self, event: impl Into<String>) {
        self.subscriptions
            .subscribe(Channel::Server, event.into(), self.slot);
    }

    pub fn unsubscribe(&mut self, event: &str) {
        self.subscriptions
            .unsubscribe(Channel::Server, event, self.slot);
    }

    /// Route window events named `event` to this hook.
    pub fn listen_window(&mut self, event: impl Into<String>) {
        self.subscriptions
            .subscribe(Channel::Window, event.into(), self.slot);
    }

    pub fn unlisten_window(&mut self, event: &str) {
        self.subscriptions
            .unsubscribe(Channel::Window, event, self.slot);
    }

    /// Start observing the element's visibility.
    ///
    /// [`HookMessage::VisibilityChanged`] arrives each time the intersection
    /// ratio crosses `threshold`. Observing again resets the observer.
    pub fn observe_visibility(&mut self, threshold: f64) {
        self.observers.observe(self.slot, threshold);
    }

    pub fn disconnect_visibility(&mut self) {
        self.observers.disconnect(self.slot);
    }

    pub fn push_event(&self, event: OutboundEvent) {
        tracing::trace!(view = %self.view, event = event.name(), "pushing event to host");
        self.bus.push_event(event);
    }

    /// A click listener that delivers `to_message(dataset)` back to this hook.
    pub fn listener<F>(&self, to_message: F) -> Listener
    where
        F: Fn(Dataset) -> HookMessage + Send + Sync + 'static,
    {
        let emitter = self.emitter.clone();
        let slot = self.slot;
        Listener::new(move |dataset| emitter.emit_to(slot, to_message(dataset)))
    }
}
