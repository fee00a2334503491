//! Static Chart Renderer
//! Draws query results as bar charts into an in-memory RGB buffer with
//! plotters and encodes them as PNG.
//!
//! Layout:
//! 1. Title centered on top
//! 2. One bar per result row, labelled from the chart's label columns
//! 3. Axis descriptions from the query's chart spec

use crate::charts::fonts::FONT_FAMILY;
use crate::query::{ChartSpec, QueryResult};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType, PolarsError};
use std::io::Cursor;
use thiserror::Error;

const BAR_COLOR: RGBColor = RGBColor(91, 155, 213);
const LABEL_SEPARATOR: &str = " / ";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Column '{0}' missing from query result")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Pixel buffer does not match {0}x{1}")]
    Buffer(u32, u32),
}

/// Bars extracted from a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    /// Bars for a charted query; `None` when the query has no chart.
    /// Rows with a null value are skipped.
    pub fn from_result(result: &QueryResult) -> Result<Option<Self>, ChartError> {
        let Some(spec) = result.spec.chart else {
            return Ok(None);
        };
        Self::from_frame(result.spec.title, &spec, &result.df).map(Some)
    }

    pub fn from_frame(title: &str, spec: &ChartSpec, df: &DataFrame) -> Result<Self, ChartError> {
        let column = |name: &str| {
            df.column(name)
                .map_err(|_| ChartError::MissingColumn(name.to_string()))
        };

        let mut label_parts: Vec<Vec<String>> = Vec::with_capacity(spec.label_columns.len());
        for &name in spec.label_columns {
            let text = column(name)?.cast(&DataType::String)?;
            let parts = text
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or("(none)").to_string())
                .collect();
            label_parts.push(parts);
        }

        let values_col = column(spec.value_column)?.cast(&DataType::Float64)?;
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (row, value) in values_col.f64()?.into_iter().enumerate() {
            let Some(value) = value else { continue };
            let label = label_parts
                .iter()
                .map(|parts| parts[row].as_str())
                .collect::<Vec<_>>()
                .join(LABEL_SEPARATOR);
            labels.push(label);
            values.push(value);
        }

        Ok(Self {
            title: title.to_string(),
            x_label: spec.x_label.to_string(),
            y_label: spec.y_label.to_string(),
            labels,
            values,
        })
    }

    /// Y-axis range that always includes zero, padded above the tallest bar.
    pub fn value_range(&self) -> (f64, f64) {
        let lo = self.values.iter().copied().fold(0.0_f64, f64::min);
        let hi = self.values.iter().copied().fold(0.0_f64, f64::max);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let lo = if lo < 0.0 { lo - span * 0.1 } else { 0.0 };
        (lo, hi + span * 0.1)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render a bar chart to PNG bytes. With `with_text` false, title and
    /// axis labels are left out (no font available).
    pub fn render_png(
        data: &ChartData,
        width: u32,
        height: u32,
        with_text: bool,
    ) -> Result<Vec<u8>, ChartError> {
        let mut buffer = vec![255u8; width as usize * height as usize * 3];
        Self::draw_bars(data, &mut buffer, width, height, with_text)
            .map_err(|e| ChartError::Draw(e.to_string()))?;

        let img = RgbImage::from_raw(width, height, buffer).ok_or(ChartError::Buffer(width, height))?;
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    fn draw_bars(
        data: &ChartData,
        buffer: &mut [u8],
        width: u32,
        height: u32,
        with_text: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        // An empty result still gets one (empty) slot on the x axis
        let slots = data.values.len().max(1);
        let (y_min, y_max) = data.value_range();

        let mut builder = ChartBuilder::on(&root);
        builder.margin(16);
        if with_text {
            builder
                .caption(&data.title, (FONT_FAMILY, 24))
                .x_label_area_size(60)
                .y_label_area_size(80);
        }
        let mut chart = builder.build_cartesian_2d((0..slots).into_segmented(), y_min..y_max)?;

        if with_text {
            let labels = &data.labels;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(slots)
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .x_label_style((FONT_FAMILY, 12))
                .y_label_style((FONT_FAMILY, 12))
                .x_desc(data.x_label.as_str())
                .y_desc(data.y_label.as_str())
                .axis_desc_style((FONT_FAMILY, 14))
                .draw()?;
        } else {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(0)
                .y_labels(0)
                .draw()?;
        }

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BAR_COLOR.filled())
                .margin(8)
                .data(data.values.iter().enumerate().map(|(i, v)| (i, *v))),
        )?;

        root.present()?;
        Ok(())
    }
}
