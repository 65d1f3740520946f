//! Seams to the third-party rendering libraries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::effect::BoxFuture;
use crate::element::{Container, ViewElement};
use crate::error::{ConfigParseError, RenderConstructionError};

/// A JSON configuration blob: chart options or a plot specification.
///
/// Always replaced wholesale; nothing in this crate patches one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderConfig(Value);

impl RenderConfig {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a serialized configuration, such as an element attribute.
    pub fn parse(source: &str) -> Result<Self, ConfigParseError> {
        Ok(Self(serde_json::from_str(source)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Builds chart instances on a host element.
pub trait ChartLibrary {
    fn create(&self, element: &dyn ViewElement, config: &RenderConfig) -> Box<dyn ChartInstance>;
}

/// A live chart bound to an element.
pub trait ChartInstance {
    /// Release the chart's canvas bindings. Called exactly once.
    fn destroy(&mut self);
}

/// Options passed along with every specification embed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedOptions {
    /// Show the export/source action menu.
    pub actions: bool,
    pub theme: String,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            actions: true,
            theme: "default".to_owned(),
        }
    }
}

/// Asynchronously builds views from declarative specifications.
pub trait SpecRenderer {
    /// Start rendering `spec` into `container`.
    ///
    /// The returned future resolves once the library has either produced a
    /// view or rejected the specification.
    fn embed(
        &self,
        container: Arc<dyn Container>,
        spec: RenderConfig,
        options: &EmbedOptions,
    ) -> BoxFuture<Result<Box<dyn SpecView>, RenderConstructionError>>;
}

/// A live view produced by a [`SpecRenderer`].
pub trait SpecView: Send {
    /// Detach the view's listeners and timers. Called exactly once.
    fn finalize(&mut self);
}
