//! A host-agnostic runtime for view-lifecycle hooks of server-rendered web UIs.
//!
//! Hooks bind elements to rendering libraries, relay configuration pushed by
//! the server and release everything when their element goes away. The host
//! (the page's view-lifecycle framework) forwards mount/update/destroy
//! callbacks and named events to a [`HookRuntime`]; hooks answer through a
//! [`HookContext`] and declare deferred work as [`Effect`]s.
//!
//! Three hooks ship with the crate, registered by [`HookRegistry::standard`]:
//!
//! - [`ChartAdapter`] (`ChartHook`) keeps one chart per element and rebuilds
//!   it on `update-chart`.
//! - [`SvgViewAdapter`] (`TucanView`) wires click and visibility events of a
//!   server-rendered SVG back to the server.
//! - [`DeclarativeSpecAdapter`] (`VegaLite`) renders a plot specification
//!   delivered through `vega_lite:<id>:init`.
//!
//! ## Example
//!
//! ```rust
//! use std::future::Future;
//! use std::pin::Pin;
//! use std::time::Duration;
//! use oxide_hooks::element::fake::FakeElement;
//! use oxide_hooks::{
//!     BoxFuture, Effect, HookContext, HookMessage, HookRegistry, HookResult, HookRuntime,
//!     TestHostBus, ViewHook,
//! };
//!
//! struct Greeter;
//!
//! impl ViewHook for Greeter {
//!     fn mounted(&mut self, ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
//!         ctx.subscribe("greet");
//!         Ok(Effect::none())
//!     }
//!
//!     fn updated(&mut self, _ctx: &mut HookContext<'_>) -> HookResult<Effect<HookMessage>> {
//!         Ok(Effect::none())
//!     }
//!
//!     fn destroyed(&mut self, _ctx: &mut HookContext<'_>) -> Effect<HookMessage> {
//!         Effect::none()
//!     }
//! }
//!
//! // Hand futures to your event loop, e.g. wasm_bindgen_futures::spawn_local
//! let spawner = |_future: Pin<Box<dyn Future<Output = ()> + Send>>| {};
//! let timer = |_delay: Duration| -> BoxFuture<()> { Box::pin(async {}) };
//!
//! let bus = TestHostBus::new();
//! let registry = HookRegistry::new().register("Greeter", || Box::new(Greeter));
//! let mut runtime = HookRuntime::new(registry, bus.boxed(), spawner, timer);
//!
//! runtime.mount("Greeter", FakeElement::new("hello").boxed());
//! assert_eq!(runtime.subscription_count(&"hello".into()), 1);
//!
//! runtime.destroy(&"hello".into());
//! assert_eq!(runtime.mounted_count(), 0);
//! ```

pub mod adapters;
mod bus;
mod config;
mod effect;
pub mod element;
mod emitter;
mod error;
mod hook;
mod registry;
mod render;
mod routing;
mod runtime;
pub mod telemetry;

// Public re-exports
pub use adapters::{ChartAdapter, DeclarativeSpecAdapter, SvgViewAdapter};
pub use bus::{
    HostBus, InteractionPayload, OutboundEvent, VisibilityPayload, INTERACTION_EVENT,
    VISIBILITY_CHANGE_EVENT,
};
pub use config::RuntimeConfig;
pub use effect::{BoxFuture, Effect};
pub use element::{
    Container, Dataset, InteractiveElement, Listener, NodeId, SvgNode, ViewElement, ViewId,
};
pub use error::{ConfigParseError, HookError, HookResult, RenderConstructionError};
pub use hook::{HookContext, HookMessage, ViewHook};
pub use registry::{HookRegistry, CHART_HOOK, SPEC_HOOK, SVG_VIEW_HOOK};
pub use render::{ChartInstance, ChartLibrary, EmbedOptions, RenderConfig, SpecRenderer, SpecView};
pub use runtime::{HookRuntime, Spawner, Timer};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use bus::TestHostBus;
#[cfg(any(test, feature = "testing"))]
pub use runtime::{TestHookDriver, TestHookRuntime, TestSpawner, TestTimer};
