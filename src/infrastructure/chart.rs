//! Bar chart rendering for the reporter

use std::path::PathBuf;

use plotters::prelude::{
    BitMapBackend, ChartBuilder, Color, FontTransform, Histogram, IntoDrawingArea, IntoFont, IntoSegmentedCoord,
    RGBColor, SegmentValue, WHITE,
};
use tracing::info;

use crate::error::{HarvestError, HarvestResult};

/// Labels and titles of one category chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// Draws a category frequency chart
pub trait ChartRenderer {
    fn render_bar_chart(&self, spec: &BarChartSpec, bars: &[(String, usize)]) -> HarvestResult<()>;
}

const BAR_COLOR: RGBColor = RGBColor(128, 0, 128);
const CHART_SIZE: (u32, u32) = (1000, 600);

/// PNG bar chart written with the plotters bitmap backend
pub struct BarChartPng {
    output_path: PathBuf,
}

impl BarChartPng {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self { output_path: output_path.into() }
    }
}

fn chart_error(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Chart(e.to_string())
}

impl ChartRenderer for BarChartPng {
    fn render_bar_chart(&self, spec: &BarChartSpec, bars: &[(String, usize)]) -> HarvestResult<()> {
        let root = BitMapBackend::new(&self.output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let y_max = bars.iter().map(|(_, count)| *count).max().unwrap_or(0) + 1;
        let mut chart = ChartBuilder::on(&root)
            .caption(&spec.title, ("sans-serif", 28).into_font())
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(60)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0..y_max)
            .map_err(chart_error)?;

        let label_of = |value: &SegmentValue<usize>| match value {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                bars.get(*i).map(|(label, _)| label.clone()).unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(spec.x_label.as_str())
            .y_desc(spec.y_label.as_str())
            .x_labels(bars.len())
            .x_label_formatter(&label_of)
            .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_COLOR.filled())
                    .margin(12)
                    .data(bars.iter().enumerate().map(|(i, (_, count))| (i, *count))),
            )
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        info!(path = %self.output_path.display(), bars = bars.len(), "Chart written");
        Ok(())
    }
}
