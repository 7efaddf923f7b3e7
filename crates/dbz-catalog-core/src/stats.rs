//! Statistics screens: affiliation grouping, bar series and the custom x-axis ticks
//! (name above a circular image under each bar).

use crate::pipeline::normalize_metric;
use crate::records::{AffiliationStatsRow, Character};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group used for empty or `unknown` affiliations.
pub const UNAFFILIATED: &str = "Sin afiliación";

pub const LABEL_MAX_CHARS: usize = 14;

/// Something that can be drawn as one bar.
pub trait ChartSource {
    fn chart_name(&self) -> &str;
    fn chart_image(&self) -> Option<&str>;
    fn chart_value(&self) -> u128;
}

impl ChartSource for Character {
    fn chart_name(&self) -> &str {
        &self.name
    }

    fn chart_image(&self) -> Option<&str> {
        Some(self.image.as_str()).filter(|s| !s.is_empty())
    }

    /// Total (max) ki; unreadable values draw as 0.
    fn chart_value(&self) -> u128 {
        normalize_metric(&self.max_ki).unwrap_or(0)
    }
}

impl ChartSource for AffiliationStatsRow {
    fn chart_name(&self) -> &str {
        &self.nombre
    }

    fn chart_image(&self) -> Option<&str> {
        self.imagen_src
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.imagen.as_deref().filter(|s| !s.is_empty()))
    }

    fn chart_value(&self) -> u128 {
        u128::from(self.total_ki)
    }
}

/// Normalize an affiliation label for grouping.
pub fn affiliation_key(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        UNAFFILIATED
    } else {
        trimmed
    }
}

/// Characters bucketed by affiliation, groups in first-seen order.
pub fn group_by_affiliation(characters: &[Character]) -> Vec<(String, Vec<&Character>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Character>)> = Vec::new();
    for c in characters {
        let key = affiliation_key(&c.affiliation);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(c);
    }
    groups
}

/// Shorten to `max` chars, replacing the tail with `…`.
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Compact y-axis label: `950`, `1.5K`, `60M`, `3B`, `90T`.
pub fn format_compact(value: u128) -> String {
    const UNITS: [(u128, &str); 4] = [
        (1_000_000_000_000, "T"),
        (1_000_000_000, "B"),
        (1_000_000, "M"),
        (1_000, "K"),
    ];
    for (scale, suffix) in UNITS {
        if value >= scale {
            let whole = value / scale;
            let tenth = (value % scale) * 10 / scale;
            return if tenth == 0 || whole >= 100 {
                format!("{}{}", whole, suffix)
            } else {
                format!("{}.{}{}", whole, tenth, suffix)
            };
        }
    }
    value.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub name: String,
    pub image: String,
    pub value: u128,
}

/// One bar chart (one affiliation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub affiliation: String,
    pub dataset_label: &'static str,
    pub bars: Vec<ChartBar>,
}

impl BarSeries {
    pub fn build<S: ChartSource>(affiliation: &str, rows: &[S], placeholder: &str) -> Self {
        let bars = rows
            .iter()
            .map(|r| ChartBar {
                label: truncate_label(r.chart_name(), LABEL_MAX_CHARS),
                name: r.chart_name().to_string(),
                image: r.chart_image().unwrap_or(placeholder).to_string(),
                value: r.chart_value(),
            })
            .collect();
        Self {
            affiliation: affiliation.to_string(),
            dataset_label: "Total KI",
            bars,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn images(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.image.as_str()).collect()
    }

    pub fn max_value(&self) -> u128 {
        self.bars.iter().map(|b| b.value).max().unwrap_or(0)
    }
}

/// Series for public API characters, grouped by affiliation.
pub fn series_from_characters(characters: &[Character], placeholder: &str) -> Vec<BarSeries> {
    group_by_affiliation(characters)
        .into_iter()
        .map(|(af, rows)| BarSeries::build(&af, &rows, placeholder))
        .collect()
}

/// Series for the backend's pre-grouped statistics, one per group in upstream order.
pub fn series_from_backend(groups: &IndexMap<String, Vec<AffiliationStatsRow>>, placeholder: &str) -> Vec<BarSeries> {
    groups
        .iter()
        .map(|(af, rows)| BarSeries::build(af, rows, placeholder))
        .collect()
}

impl<T: ChartSource + ?Sized> ChartSource for &T {
    fn chart_name(&self) -> &str {
        (**self).chart_name()
    }

    fn chart_image(&self) -> Option<&str> {
        (**self).chart_image()
    }

    fn chart_value(&self) -> u128 {
        (**self).chart_value()
    }
}

/// Plot area in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Outer padding reserved around the plot; the bottom leaves room for name + image.
pub const CHART_PADDING: (f64, f64, f64, f64) = (8.0, 12.0, 86.0, 4.0);

impl ChartArea {
    /// Plot area of a `width`×`height` canvas with [`CHART_PADDING`] (top, right, bottom, left).
    pub fn from_canvas(width: f64, height: f64) -> Self {
        let (top, right, bottom, left) = CHART_PADDING;
        Self {
            left,
            top,
            right: (width - right).max(left),
            bottom: (height - bottom).max(top),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTickOptions {
    /// Image diameter.
    pub size: f64,
    /// Distance from the plot bottom to the image center.
    pub y_offset: f64,
    pub label_color: String,
    pub font: String,
}

impl Default for ImageTickOptions {
    fn default() -> Self {
        Self {
            size: 30.0,
            y_offset: 30.0,
            label_color: "#64748b".to_string(),
            font: "700 11px Inter, Roboto, \"Helvetica Neue\", Arial".to_string(),
        }
    }
}

impl ImageTickOptions {
    /// Larger, near-black names used by the backend statistics charts.
    pub fn emphasized() -> Self {
        Self {
            label_color: "#36393fff".to_string(),
            font: "700 13px Inter, Roboto, \"Helvetica Neue\", Arial".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGlyph {
    pub text: String,
    pub x: f64,
    /// Alphabetic baseline, centered on `x`.
    pub baseline_y: f64,
}

/// Circular image clip on a white disc with a thin border.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGlyph {
    pub src: String,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickGlyph {
    pub index: usize,
    pub x: f64,
    pub label: Option<LabelGlyph>,
    pub image: Option<ImageGlyph>,
}

/// Lay out one glyph per category tick. Without any image nothing is drawn.
pub fn layout_ticks(area: &ChartArea, labels: &[&str], images: &[&str], opts: &ImageTickOptions) -> Vec<TickGlyph> {
    if images.is_empty() || labels.is_empty() {
        return Vec::new();
    }
    let n = labels.len() as f64;
    let step = area.width() / n;
    let half = opts.size / 2.0;
    let y_img = area.bottom + opts.y_offset;

    labels
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let x = area.left + (i as f64 + 0.5) * step;
            let label = (!text.is_empty()).then(|| LabelGlyph {
                text: text.to_string(),
                x,
                baseline_y: y_img - half - 6.0,
            });
            let image = images
                .get(i)
                .filter(|src| !src.is_empty())
                .map(|src| ImageGlyph {
                    src: src.to_string(),
                    cx: x,
                    cy: y_img,
                    radius: half,
                });
            TickGlyph { index: i, x, label, image }
        })
        .collect()
}

/// A chart ready for the client: series, axis ticks and tick glyphs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPanel {
    pub series: BarSeries,
    pub area: ChartArea,
    pub y_axis_max: String,
    pub ticks: Vec<TickGlyph>,
}

impl ChartPanel {
    pub fn new(series: BarSeries, width: f64, height: f64, opts: &ImageTickOptions) -> Self {
        let area = ChartArea::from_canvas(width, height);
        let ticks = layout_ticks(&area, &series.labels(), &series.images(), opts);
        let y_axis_max = format_compact(series.max_value());
        Self { series, area, y_axis_max, ticks }
    }
}
