//! SVG view hook: interaction wiring and visibility tracking for
//! server-rendered SVG visualizations.

use core::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::bus::OutboundEvent;
use crate::config::RuntimeConfig;
use crate::effect::Effect;
use crate::element::{InteractiveElement, Listener, NodeId, SvgNode};
use crate::error::HookResult;
use crate::hook::{HookContext, HookMessage, ViewHook};

struct SvgSnapshot {
    node: NodeId,
    markup: String,
}

/// A listener attached to one interactive element.
///
/// The listener is kept so that teardown removes the very listener that was
/// added.
struct InteractionBinding {
    element: Box<dyn InteractiveElement>,
    listener: Listener,
}

impl InteractionBinding {
    fn release(self) {
        self.element.remove_click_listener(&self.listener);
    }
}

enum SvgViewState {
    Unbound,
    Bound {
        snapshot: SvgSnapshot,
        bindings: Vec<InteractionBinding>,
    },
    Disposed,
}

/// Tracks the SVG rendered inside an element.
///
/// - Clicks on elements matching the interactive selector are pushed to the
///   server as `tucan-interaction` events.
/// - Becoming visible pushes `tucan-visibility-change`; re-rendering is left
///   to the server.
/// - When the SVG markup changes on update, or a different SVG node shows up
///   after a navigation, listeners are moved to the new content.
///
/// An element without an SVG at mount is a valid empty state.
pub struct SvgViewAdapter {
    threshold: f64,
    selector: String,
    navigation_event: String,
    settle_delay: Duration,
    state: SvgViewState,
}

impl SvgViewAdapter {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            threshold: config.visibility_threshold,
            selector: config.interactive_selector.clone(),
            navigation_event: config.navigation_event.clone(),
            settle_delay: config.navigation_settle_delay(),
            state: SvgViewState::Unbound,
        }
    }

    fn bind(&mut self, ctx: &mut HookContext<'_>, svg: &dyn SvgNode) {
        let bindings = self.attach(ctx, svg);
        debug!(view = %ctx.view_id(), bindings = bindings.len(), "svg bound");
        self.state = SvgViewState::Bound {
            snapshot: SvgSnapshot {
                node: svg.node_id(),
                markup: svg.outer_html(),
            },
            bindings,
        };
        ctx.observe_visibility(self.threshold);
        ctx.listen_window(self.navigation_event.clone());
    }

    fn rebind(&mut self, ctx: &mut HookContext<'_>, svg: &dyn SvgNode) {
        self.release_bindings();
        let fresh = self.attach(ctx, svg);
        debug!(view = %ctx.view_id(), bindings = fresh.len(), "svg rebound");
        if let SvgViewState::Bound { snapshot, bindings } = &mut self.state {
            *snapshot = SvgSnapshot {
                node: svg.node_id(),
                markup: svg.outer_html(),
            };
            *bindings = fresh;
        }
    }

    fn attach(&self, ctx: &HookContext<'_>, svg: &dyn SvgNode) -> Vec<InteractionBinding> {
        svg.query_all(&self.selector)
            .into_iter()
            .map(|element| {
                let listener = ctx.listener(HookMessage::DataPointClicked);
                element.add_click_listener(&listener);
                InteractionBinding { element, listener }
            })
            .collect()
    }

    fn release_bindings(&mut self) {
        if let SvgViewState::Bound { bindings, .. } = &mut self.state {
            for binding in bindings.drain(..) {
                binding.release();
            }
        }
    }

    fn markup_changed(&self, svg: &dyn SvgNode) -> bool {
        match &self.state {
            SvgViewState::Bound { snapshot, .. } => svg.outer_html() != snapshot.markup,
            _ => false,
        }
    }

    fn node_replaced(&self, svg: &dyn SvgNode) -> bool {
        match &self.state {
            SvgViewState::Bound { snapshot, .. } => svg.node_id() != snapshot.node,
            _ => false,
        }
    }

    fn is_bound(&self) -> bool {
        matches!(self.state, SvgViewState::Bound { .. })
    }
}

impl ViewHook for SvgViewAdapter {
    fn mounted(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        match ctx.element().svg() {
            Some(svg) => self.bind(ctx, svg.as_ref()),
            None => debug!(view = %ctx.view_id(), "no svg at mount"),
        }
        Ok(Effect::none())
    }

    fn updated(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        let Some(svg) = ctx.element().svg() else {
            return Ok(Effect::none());
        };
        if matches!(self.state, SvgViewState::Unbound) {
            self.bind(ctx, svg.as_ref());
        } else if self.markup_changed(svg.as_ref()) {
            self.rebind(ctx, svg.as_ref());
        }
        Ok(Effect::none())
    }

    fn destroyed(&mut self, ctx: &mut HookContext<'_>) -> Effect<HookMessage> {
        self.release_bindings();
        ctx.disconnect_visibility();
        ctx.unlisten_window(&self.navigation_event);
        self.state = SvgViewState::Disposed;
        Effect::none()
    }

    fn handle_event(
        &mut self,
        ctx: &mut HookContext<'_>,
        event: &str,
        _payload: &Value,
    ) -> HookResult<Effect<HookMessage>> {
        if !self.is_bound() || event != self.navigation_event {
            return Ok(Effect::none());
        }
        trace!(view = %ctx.view_id(), "navigation completed, waiting for dom to settle");
        Ok(Effect::delay(
            self.settle_delay,
            HookMessage::NavigationSettled,
        ))
    }

    fn handle_message(
        &mut self,
        ctx: &mut HookContext<'_>,
        message: HookMessage,
    ) -> Effect<HookMessage> {
        if !self.is_bound() {
            return Effect::none();
        }
        match message {
            HookMessage::DataPointClicked(data) => {
                ctx.push_event(OutboundEvent::data_point_click(data));
            }
            HookMessage::VisibilityChanged { visible: true } => {
                ctx.push_event(OutboundEvent::became_visible(ctx.view_id().clone()));
            }
            HookMessage::NavigationSettled => {
                if !ctx.element().is_fully_in_viewport() {
                    return Effect::none();
                }
                if let Some(svg) = ctx.element().svg() {
                    if self.node_replaced(svg.as_ref()) {
                        self.rebind(ctx, svg.as_ref());
                    }
                }
            }
            _ => {}
        }
        Effect::none()
    }
}
