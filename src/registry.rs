//! Mapping from hook names to hook factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adapters::{ChartAdapter, DeclarativeSpecAdapter, SvgViewAdapter};
use crate::config::RuntimeConfig;
use crate::error::{ConfigParseError, HookError, HookResult};
use crate::hook::ViewHook;
use crate::render::{ChartLibrary, SpecRenderer};

pub const CHART_HOOK: &str = "ChartHook";
pub const SVG_VIEW_HOOK: &str = "TucanView";
pub const SPEC_HOOK: &str = "VegaLite";

type HookFactory = Box<dyn Fn() -> Box<dyn ViewHook>>;

/// Hook factories keyed by the name elements declare.
///
/// Handed to the runtime at construction; there is no global registry.
///
/// ```rust
/// use oxide_hooks::{Effect, HookContext, HookMessage, HookRegistry, HookResult, ViewHook};
///
/// struct Noop;
///
/// impl ViewHook for Noop {
///     fn mounted(&mut self, _: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
///         Ok(Effect::none())
///     }
///     fn updated(&mut self, _: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
///         Ok(Effect::none())
///     }
///     fn destroyed(&mut self, _: &mut HookContext<'_>) -> Effect<HookMessage> {
///         Effect::none()
///     }
/// }
///
/// let registry = HookRegistry::new().register("Noop", || Box::new(Noop));
/// assert!(registry.contains("Noop"));
/// ```
#[derive(Default)]
pub struct HookRegistry {
    factories: HashMap<String, HookFactory>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the chart, SVG view and specification hooks under
    /// [`CHART_HOOK`], [`SVG_VIEW_HOOK`] and [`SPEC_HOOK`].
    ///
    /// `config` is validated first, so hand-built configurations get the
    /// same checks as [`RuntimeConfig::from_json`].
    pub fn standard(
        config: &RuntimeConfig,
        charts: Arc<dyn ChartLibrary>,
        specs: Arc<dyn SpecRenderer>,
    ) -> Result<Self, ConfigParseError> {
        config.validate()?;
        let svg_config = config.clone();
        let prefix = config.spec_event_prefix.clone();
        let embed = config.embed.clone();

        Ok(Self::new()
            .register(CHART_HOOK, move || {
                Box::new(ChartAdapter::new(charts.clone()))
            })
            .register(SVG_VIEW_HOOK, move || {
                Box::new(SvgViewAdapter::new(&svg_config))
            })
            .register(SPEC_HOOK, move || {
                Box::new(DeclarativeSpecAdapter::new(
                    specs.clone(),
                    prefix.clone(),
                    embed.clone(),
                ))
            }))
    }

    /// Register `factory` under `name`, replacing any previous factory.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ViewHook> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub(crate) fn create(&self, name: &str) -> HookResult<Box<dyn ViewHook>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| HookError::UnknownHook(name.to_owned()))
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}
