//! Chart hook: one chart instance per element, rebuilt on demand.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::effect::Effect;
use crate::error::{ConfigParseError, HookResult};
use crate::hook::{HookContext, HookMessage, ViewHook};
use crate::render::{ChartInstance, ChartLibrary, RenderConfig};

/// Attribute holding the serialized chart configuration.
pub const CHART_CONFIG_ATTRIBUTE: &str = "data-chart-config";
/// Server event carrying a replacement configuration.
pub const UPDATE_CHART_EVENT: &str = "update-chart";

#[derive(Deserialize)]
struct UpdateChartPayload {
    config: RenderConfig,
}

/// Binds a [`ChartLibrary`] chart to an element.
///
/// The chart is built from `data-chart-config` on mount and rebuilt from
/// scratch on every `update-chart` event, identical payloads included. The
/// previous chart is always destroyed before its replacement is created.
pub struct ChartAdapter {
    library: Arc<dyn ChartLibrary>,
    chart: Option<Box<dyn ChartInstance>>,
    destroyed: bool,
}

impl ChartAdapter {
    pub fn new(library: Arc<dyn ChartLibrary>) -> Self {
        Self {
            library,
            chart: None,
            destroyed: false,
        }
    }

    fn dispose(&mut self) {
        if let Some(mut chart) = self.chart.take() {
            chart.destroy();
        }
    }

    fn rebuild(&mut self, ctx: &HookContext<'_>, config: &RenderConfig) {
        self.dispose();
        self.chart = Some(self.library.create(ctx.element(), config));
    }
}

impl ViewHook for ChartAdapter {
    fn mounted(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        let source = ctx
            .element()
            .attribute(CHART_CONFIG_ATTRIBUTE)
            .ok_or(ConfigParseError::MissingSource(CHART_CONFIG_ATTRIBUTE))?;
        let config = RenderConfig::parse(&source)?;

        self.rebuild(ctx, &config);
        ctx.subscribe(UPDATE_CHART_EVENT);
        debug!(view = %ctx.view_id(), "chart created");
        Ok(Effect::none())
    }

    fn updated(&mut self, _ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
        Ok(Effect::none())
    }

    fn destroyed(&mut self, ctx: &mut HookContext<'_>) -> Effect<HookMessage> {
        self.dispose();
        ctx.unsubscribe(UPDATE_CHART_EVENT);
        self.destroyed = true;
        Effect::none()
    }

    fn handle_event(
        &mut self,
        ctx: &mut HookContext<'_>,
        event: &str,
        payload: &Value,
    ) -> HookResult<Effect<HookMessage>> {
        if self.destroyed || event != UPDATE_CHART_EVENT {
            return Ok(Effect::none());
        }
        let UpdateChartPayload { config } =
            UpdateChartPayload::deserialize(payload).map_err(ConfigParseError::from)?;

        self.rebuild(ctx, &config);
        debug!(view = %ctx.view_id(), "chart rebuilt");
        Ok(Effect::none())
    }
}
