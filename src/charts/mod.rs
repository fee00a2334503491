//! Charts Module
//! Bar chart rendering for the charted queries.

pub mod fonts;
mod renderer;

pub use fonts::ensure_chart_font;
pub use renderer::{ChartData, ChartError, StaticChartRenderer};
