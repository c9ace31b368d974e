//! Bar-chart layout: band x-axis over the labels, linear y-axis with d3-style nice ticks.

use crate::model::{Bounds, ChartBar, ChartCategory, ChartLayout, ChartLegendItem, ChartTick};
use crate::text::{TextMeasurer, TextStyle};
use crate::{Error, Result};
use studymap_core::{ChartDataset, StudyConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Fraction of each band left empty, split evenly on both sides.
    pub bar_padding: f64,
    pub tick_count: usize,
    pub font_size: f64,
    pub palette: Vec<String>,
}

impl Default for ChartLayoutConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
            bar_padding: 0.2,
            tick_count: 5,
            font_size: 12.0,
            palette: default_palette(),
        }
    }
}

impl ChartLayoutConfig {
    pub fn from_config(config: &StudyConfig) -> Self {
        let d = Self::default();
        Self {
            width: config
                .get_f64("chart.width")
                .filter(|v| *v > 0.0)
                .unwrap_or(d.width),
            height: config
                .get_f64("chart.height")
                .filter(|v| *v > 0.0)
                .unwrap_or(d.height),
            bar_padding: config
                .get_f64("chart.barPadding")
                .unwrap_or(d.bar_padding)
                .clamp(0.0, 0.9),
            tick_count: config
                .get_u64("chart.tickCount")
                .map_or(d.tick_count, |v| v.max(1) as usize),
            font_size: d.font_size,
            palette: d.palette,
        }
    }
}

fn default_palette() -> Vec<String> {
    "#4E79A7,#F28E2B,#59A14F,#E15759,#76B7B2,#EDC948,#B07AA1,#FF9DA7,#9C755F,#BAB0AC"
        .split(',')
        .map(|s| s.trim().to_string())
        .collect()
}

fn palette_color(palette: &[String], index: usize) -> String {
    if palette.is_empty() {
        return "#4E79A7".to_string();
    }
    palette[index % palette.len()].clone()
}

/// d3-array `ticks(start, stop, count)`.
pub fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, f64)> {
        let step = (stop - start) / count;
        if !step.is_finite() || step <= 0.0 {
            return None;
        }
        let power = step.log10().floor();
        let error = step / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

        let (i1, i2, inc) = if power < 0.0 {
            let inc = 10f64.powf(-power) / factor;
            let mut i1 = (start * inc).round() as i64;
            let mut i2 = (stop * inc).round() as i64;
            if (i1 as f64) / inc < start {
                i1 += 1;
            }
            if (i2 as f64) / inc > stop {
                i2 -= 1;
            }
            (i1, i2, -inc)
        } else {
            let inc = 10f64.powf(power) * factor;
            let mut i1 = (start / inc).round() as i64;
            let mut i2 = (stop / inc).round() as i64;
            if (i1 as f64) * inc < start {
                i1 += 1;
            }
            if (i2 as f64) * inc > stop {
                i2 -= 1;
            }
            (i1, i2, inc)
        };

        if i2 < i1 && (0.5..2.0).contains(&count) {
            return tick_spec(start, stop, count * 2.0);
        }
        (inc.is_finite() && inc != 0.0).then_some((i1, i2, inc))
    }

    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let (a, b) = if stop < start {
        (stop, start)
    } else {
        (start, stop)
    };
    let Some((i1, i2, inc)) = tick_spec(a, b, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }
    (i1..=i2)
        .map(|i| {
            if inc < 0.0 {
                i as f64 / -inc
            } else {
                i as f64 * inc
            }
        })
        .collect()
}

/// Extends `[lo, hi]` outwards to the tick step, like d3 `scale.nice()`.
fn nice_domain(lo: f64, hi: f64, count: usize) -> (f64, f64) {
    let ticks = nice_ticks(lo, hi, count);
    if ticks.len() < 2 {
        return (lo, hi);
    }
    let step = ticks[1] - ticks[0];
    ((lo / step).floor() * step, (hi / step).ceil() * step)
}

fn fmt_tick(v: f64) -> String {
    let r = (v * 1e6).round() / 1e6;
    if r == 0.0 {
        return "0".to_string();
    }
    r.to_string()
}

pub fn layout_chart(
    dataset: &ChartDataset,
    config: &ChartLayoutConfig,
    measurer: &dyn TextMeasurer,
) -> Result<ChartLayout> {
    if !dataset.is_consistent() {
        return Err(Error::InvalidModel {
            message: "every chart series must have one value per label".to_string(),
        });
    }

    let values = dataset
        .series
        .iter()
        .flat_map(|s| s.values.iter().flatten().copied());
    let (mut lo, mut hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo == hi {
        hi = lo + 1.0;
    }
    (lo, hi) = nice_domain(lo, hi, config.tick_count);

    let style = TextStyle {
        font_size: config.font_size,
        ..TextStyle::default()
    };
    let tick_values = nice_ticks(lo, hi, config.tick_count);
    let tick_label_width = tick_values
        .iter()
        .map(|v| measurer.measure(&fmt_tick(*v), &style).width)
        .fold(0.0, f64::max);
    let line = measurer.line_height(&style);
    let legend_height = if dataset.series.is_empty() { 0.0 } else { line + 8.0 };

    let plot = Bounds {
        min_x: tick_label_width + 16.0,
        min_y: legend_height + 12.0,
        max_x: (config.width - 16.0).max(tick_label_width + 17.0),
        max_y: (config.height - line - 16.0).max(legend_height + 13.0),
    };
    let y_of = |v: f64| plot.max_y - (v - lo) / (hi - lo) * plot.height();
    let baseline_y = y_of(0.0);

    let ticks = tick_values
        .iter()
        .map(|v| ChartTick {
            value: *v,
            y: y_of(*v),
            label: fmt_tick(*v),
        })
        .collect();

    let bands = dataset.labels.len().max(1) as f64;
    let step = plot.width() / bands;
    let inner = step * (1.0 - config.bar_padding);
    let offset = step * config.bar_padding / 2.0;
    let per_series = inner / dataset.series.len().max(1) as f64;

    let categories = dataset
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| ChartCategory {
            label: label.clone(),
            x: plot.min_x + (i as f64 + 0.5) * step,
        })
        .collect();

    let mut bars = Vec::new();
    for (si, series) in dataset.series.iter().enumerate() {
        let color = palette_color(&config.palette, si);
        for (ci, value) in series.values.iter().enumerate() {
            let Some(v) = *value else {
                continue;
            };
            let top = y_of(v.max(0.0));
            let bottom = y_of(v.min(0.0));
            bars.push(ChartBar {
                category: ci,
                series: si,
                value: v,
                x: plot.min_x + ci as f64 * step + offset + si as f64 * per_series,
                y: top,
                width: per_series,
                height: bottom - top,
                color: color.clone(),
            });
        }
    }

    let legend = dataset
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| ChartLegendItem {
            name: s.name.clone(),
            color: palette_color(&config.palette, i),
        })
        .collect();

    tracing::debug!(
        categories = dataset.labels.len(),
        bars = bars.len(),
        domain_lo = lo,
        domain_hi = hi,
        "chart laid out"
    );

    Ok(ChartLayout {
        width: config.width,
        height: config.height,
        plot,
        baseline_y,
        font_size: config.font_size,
        categories,
        ticks,
        bars,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;
    use studymap_core::ChartSeries;

    fn dataset(values: Vec<Option<f64>>) -> ChartDataset {
        ChartDataset {
            labels: (0..values.len()).map(|i| format!("s{i}")).collect(),
            series: vec![ChartSeries {
                name: "score".to_string(),
                values,
            }],
        }
    }

    #[test]
    fn ticks_match_d3() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(nice_domain(0.0, 8.5, 5), (0.0, 10.0));
    }

    #[test]
    fn null_values_leave_gaps() {
        let l = layout_chart(
            &dataset(vec![Some(8.5), None, Some(7.0)]),
            &ChartLayoutConfig::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert_eq!(l.categories.len(), 3);
        assert_eq!(l.bars.len(), 2);
        assert_eq!(l.bars.iter().map(|b| b.category).collect::<Vec<_>>(), [0, 2]);
    }

    #[test]
    fn taller_values_draw_taller_bars_from_the_baseline() {
        let l = layout_chart(
            &dataset(vec![Some(8.5), Some(7.0)]),
            &ChartLayoutConfig::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert!(l.bars[0].height > l.bars[1].height);
        for b in &l.bars {
            assert!((b.y + b.height - l.baseline_y).abs() < 1e-9);
            assert!(b.x >= l.plot.min_x && b.x + b.width <= l.plot.max_x + 1e-9);
        }
    }

    #[test]
    fn negative_values_hang_below_zero() {
        let l = layout_chart(
            &dataset(vec![Some(-3.0), Some(4.0)]),
            &ChartLayoutConfig::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap();
        assert!((l.bars[0].y - l.baseline_y).abs() < 1e-9);
        assert!(l.ticks.iter().any(|t| t.value < 0.0));
    }

    #[test]
    fn inconsistent_dataset_is_rejected() {
        let mut ds = dataset(vec![Some(1.0)]);
        ds.labels.push("extra".to_string());
        let err = layout_chart(
            &ds,
            &ChartLayoutConfig::default(),
            &DeterministicTextMeasurer::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidModel { .. }));
    }
}
