//! The standard hooks.

mod chart;
mod spec;
mod svg_view;

pub use chart::{ChartAdapter, CHART_CONFIG_ATTRIBUTE, UPDATE_CHART_EVENT};
pub use spec::{DeclarativeSpecAdapter, SPEC_ID_ATTRIBUTE};
pub use svg_view::SvgViewAdapter;
