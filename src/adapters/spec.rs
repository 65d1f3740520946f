//! Declarative specification hook: renders a plot specification pushed by
//! the server into a nested container.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::effect::Effect;
use crate::element::Container;
use crate::error::{ConfigParseError, HookResult};
use crate::hook::{HookContext, HookMessage, ViewHook};
use crate::render::{EmbedOptions, RenderConfig, SpecRenderer, SpecView};

/// Attribute holding the plot id used in the init event name.
pub const SPEC_ID_ATTRIBUTE: &str = "data-id";

#[derive(Deserialize)]
struct SpecInitPayload {
    spec: RenderConfig,
}

/// What to do with a view once its pending construction resolves.
enum AfterSettle {
    Keep,
    Dispose,
    Replace(RenderConfig),
}

enum SpecSlot {
    Empty,
    Pending { ticket: u64, after: AfterSettle },
    Live(Box<dyn SpecView>),
}

/// Renders specifications delivered through `<prefix>:<id>:init`.
///
/// Nothing is rendered at mount. An element without a plot id keeps its
/// empty container and never receives a specification.
///
/// Construction is asynchronous and cannot be cancelled, so disposal
/// requested while it is in flight is deferred until it resolves. Each view
/// is finalized exactly once. A rejected specification is logged and leaves
/// the container empty; it is not retried.
pub struct DeclarativeSpecAdapter {
    renderer: Arc<dyn SpecRenderer>,
    event_prefix: String,
    embed: EmbedOptions,
    init_event: Option<String>,
    container: Option<Arc<dyn Container>>,
    slot: SpecSlot,
    next_ticket: u64,
    destroyed: bool,
}

impl DeclarativeSpecAdapter {
    pub fn new(
        renderer: Arc<dyn SpecRenderer>,
        event_prefix: impl Into<String>,
        embed: EmbedOptions,
    ) -> Self {
        Self {
            renderer,
            event_prefix: event_prefix.into(),
            embed,
            init_event: None,
            container: None,
            slot: SpecSlot::Empty,
            next_ticket: 0,
            destroyed: false,
        }
    }

    fn start(&mut self, spec: RenderConfig) -> Effect<HookMessage> {
        let Some(container) = self.container.clone() else {
            return Effect::none();
        };
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.slot = SpecSlot::Pending {
            ticket,
            after: AfterSettle::Keep,
        };

        let embedding = self.renderer.embed(container, spec, &self.embed);
        Effect::task(async move {
            HookMessage::SpecSettled {
                ticket,
                outcome: embedding.await,
            }
        })
    }

    /// Finalize the live view now, or once the pending one resolves.
    fn release(&mut self) {
        match core::mem::replace(&mut self.slot, SpecSlot::Empty) {
            SpecSlot::Empty => {}
            SpecSlot::Pending { ticket, .. } => {
                self.slot = SpecSlot::Pending {
                    ticket,
                    after: AfterSettle::Dispose,
                }
            }
            SpecSlot::Live(mut view) => view.finalize(),
        }
    }
}

impl ViewHook for DeclarativeSpecAdapter {
    fn mounted(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        self.container = Some(ctx.element_mut().append_container());
        let Some(id) = ctx.element().attribute(SPEC_ID_ATTRIBUTE) else {
            debug!(view = %ctx.view_id(), "no plot id, nothing to wait for");
            return Ok(Effect::none());
        };
        let init_event = format!("{}:{}:init", self.event_prefix, id);
        ctx.subscribe(init_event.clone());
        debug!(view = %ctx.view_id(), event = %init_event, "waiting for specification");
        self.init_event = Some(init_event);
        Ok(Effect::none())
    }

    fn updated(&mut self, _ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        self.release();
        Ok(Effect::none())
    }

    fn destroyed(&mut self, ctx: &mut HookContext<'_>) -> Effect<HookMessage> {
        self.release();
        if let Some(event) = self.init_event.take() {
            ctx.unsubscribe(&event);
        }
        self.destroyed = true;
        Effect::none()
    }

    fn handle_event(
        &mut self,
        _ctx: &mut HookContext<'_>,
        event: &str,
        payload: &Value,
    ) -> HookResult<Effect<HookMessage>> {
        if self.destroyed || self.init_event.as_deref() != Some(event) {
            return Ok(Effect::none());
        }
        let SpecInitPayload { spec } =
            SpecInitPayload::deserialize(payload).map_err(ConfigParseError::from)?;

        if let SpecSlot::Pending { after, .. } = &mut self.slot {
            *after = AfterSettle::Replace(spec);
            return Ok(Effect::none());
        }
        self.release();
        Ok(self.start(spec))
    }

    fn handle_message(
        &mut self,
        ctx: &mut HookContext<'_>,
        message: HookMessage,
    ) -> Effect<HookMessage> {
        let HookMessage::SpecSettled { ticket, outcome } = message else {
            return Effect::none();
        };
        let expected = matches!(self.slot, SpecSlot::Pending { ticket: pending, .. } if pending == ticket);
        if !expected {
            if let Ok(mut view) = outcome {
                view.finalize();
            }
            return Effect::none();
        }
        let SpecSlot::Pending { after, .. } = core::mem::replace(&mut self.slot, SpecSlot::Empty) else {
            return Effect::none();
        };

        match outcome {
            Ok(view) => match after {
                AfterSettle::Keep => {
                    debug!(view = %ctx.view_id(), "specification rendered");
                    self.slot = SpecSlot::Live(view);
                    Effect::none()
                }
                AfterSettle::Dispose => {
                    let mut view = view;
                    view.finalize();
                    Effect::none()
                }
                AfterSettle::Replace(spec) => {
                    let mut view = view;
                    view.finalize();
                    self.start(spec)
                }
            },
            Err(failure) => {
                error!(
                    view = %ctx.view_id(),
                    "failed to render the given specification, got the following error:\n\n    {}\n\nmake sure to check for typos",
                    failure.message()
                );
                if let Some(container) = &self.container {
                    container.clear();
                }
                match after {
                    AfterSettle::Replace(spec) => self.start(spec),
                    _ => Effect::none(),
                }
            }
        }
    }

    fn is_settled(&self) -> bool {
        !matches!(self.slot, SpecSlot::Pending { .. })
    }
}
