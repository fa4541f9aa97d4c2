//! Chart planning: which views a result set supports and the series each
//! one plots. Plans serialize to JSON; drawing is left to the consumer.

use serde::Serialize;

use crate::models::{Cell, ResultSet};

const MAX_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPlan {
    pub views: Vec<ChartView>,
}

impl ChartPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// One line per view, for terminal listings.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.views.iter().map(ChartView::summary).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartView {
    Map {
        title: String,
        points: Vec<MapPoint>,
    },
    Histogram {
        title: String,
        column: String,
        bins: Vec<HistogramBin>,
    },
    Scatter {
        title: String,
        x_column: String,
        y_column: String,
        /// Depth axes grow downward.
        y_reversed: bool,
        points: Vec<[f64; 2]>,
    },
    BoxStats {
        title: String,
        column: String,
        stats: BoxStats,
    },
    DepthProfile {
        title: String,
        series: Vec<ProfileSeries>,
    },
}

impl ChartView {
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Map { title, points } => format!("{title}: {} located points", points.len()),
            Self::Histogram { title, bins, .. } => format!(
                "{title}: {} values in {} bins",
                bins.iter().map(|bin| bin.count).sum::<usize>(),
                bins.len()
            ),
            Self::Scatter { title, points, .. } => format!("{title}: {} points", points.len()),
            Self::BoxStats { title, stats, .. } => format!(
                "{title}: min {:.2}, median {:.2}, max {:.2} over {} values",
                stats.min, stats.median, stats.max, stats.count
            ),
            Self::DepthProfile { title, series } => format!(
                "{title}: {} series, {} points",
                series.len(),
                series.iter().map(|line| line.points.len()).sum::<usize>()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// `(temperature - min + 1) * 10` when temperature is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSeries {
    pub name: String,
    /// `[temperature, pressure]` pairs.
    pub points: Vec<[f64; 2]>,
}

#[must_use]
pub fn plan_charts(result: &ResultSet) -> ChartPlan {
    let mut views = Vec::new();
    if result.is_empty() {
        return ChartPlan { views };
    }

    if let Some(map) = map_view(result) {
        views.push(map);
    }

    if result.has_column("temperature") {
        views.extend(histogram_view(result, "temperature", "Temperature Distribution"));
        if result.has_column("pressure") {
            views.push(scatter_view(
                result,
                "temperature",
                "pressure",
                "Temperature vs Depth",
                true,
            ));
        } else {
            views.extend(box_view(result, "temperature", "Temperature Range"));
        }
    }

    if result.has_column("salinity") {
        views.extend(histogram_view(result, "salinity", "Salinity Distribution"));
        if result.has_column("temperature") {
            views.push(scatter_view(
                result,
                "temperature",
                "salinity",
                "Temperature vs Salinity",
                false,
            ));
        } else {
            views.extend(box_view(result, "salinity", "Salinity Range"));
        }
    }

    if result.has_columns(&["pressure", "temperature"]) {
        views.push(depth_profile_view(result));
    }

    ChartPlan { views }
}

fn map_view(result: &ResultSet) -> Option<ChartView> {
    let latitude = result.column_index("latitude")?;
    let longitude = result.column_index("longitude")?;
    let temperature = result.column_index("temperature");
    let platform = result.column_index("platform_number");

    let mut points = result
        .rows
        .iter()
        .filter_map(|row| {
            Some(MapPoint {
                latitude: row.get(latitude)?.as_f64()?,
                longitude: row.get(longitude)?.as_f64()?,
                platform_number: platform
                    .and_then(|index| row.get(index))
                    .filter(|cell| !cell.is_null())
                    .map(ToString::to_string),
                temperature: temperature
                    .and_then(|index| row.get(index))
                    .and_then(|cell| cell.as_f64()),
                marker_size: None,
            })
        })
        .collect::<Vec<_>>();
    if points.is_empty() {
        return None;
    }

    let minimum = points
        .iter()
        .filter_map(|point| point.temperature)
        .reduce(f64::min);
    if let Some(minimum) = minimum {
        for point in &mut points {
            point.marker_size = point
                .temperature
                .map(|temperature| (temperature - minimum + 1.0) * 10.0);
        }
    }

    Some(ChartView::Map {
        title: "Float Locations".to_string(),
        points,
    })
}

fn histogram_view(result: &ResultSet, column: &str, title: &str) -> Option<ChartView> {
    let values = result.column_values(column);
    let bins = histogram_bins(&values);
    if bins.is_empty() {
        return None;
    }
    Some(ChartView::Histogram {
        title: title.to_string(),
        column: column.to_string(),
        bins,
    })
}

fn box_view(result: &ResultSet, column: &str, title: &str) -> Option<ChartView> {
    let stats = box_stats(&result.column_values(column))?;
    Some(ChartView::BoxStats {
        title: title.to_string(),
        column: column.to_string(),
        stats,
    })
}

fn scatter_view(
    result: &ResultSet,
    x_column: &str,
    y_column: &str,
    title: &str,
    y_reversed: bool,
) -> ChartView {
    ChartView::Scatter {
        title: title.to_string(),
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        y_reversed,
        points: paired_values(result, x_column, y_column, |_| true),
    }
}

fn depth_profile_view(result: &ResultSet) -> ChartView {
    let series = match result.column_index("platform_number") {
        Some(platform) => {
            let mut platforms: Vec<String> = Vec::new();
            for row in &result.rows {
                let name = row.get(platform).map(ToString::to_string).unwrap_or_default();
                if !platforms.contains(&name) {
                    platforms.push(name);
                }
            }
            platforms
                .into_iter()
                .map(|name| ProfileSeries {
                    points: paired_values(result, "temperature", "pressure", |row| {
                        row.get(platform).map(ToString::to_string).unwrap_or_default() == name
                    }),
                    name: format!("Float {name}"),
                })
                .collect()
        }
        None => vec![ProfileSeries {
            name: "All measurements".to_string(),
            points: paired_values(result, "temperature", "pressure", |_| true),
        }],
    };

    ChartView::DepthProfile {
        title: "Depth Profile".to_string(),
        series,
    }
}

fn paired_values(
    result: &ResultSet,
    x_column: &str,
    y_column: &str,
    keep: impl Fn(&[Cell]) -> bool,
) -> Vec<[f64; 2]> {
    let (Some(x), Some(y)) = (result.column_index(x_column), result.column_index(y_column))
    else {
        return Vec::new();
    };
    result
        .rows
        .iter()
        .filter(|row| keep(row.as_slice()))
        .filter_map(|row| Some([row.get(x)?.as_f64()?, row.get(y)?.as_f64()?]))
        .collect()
}

/// Equal-width bins, `ceil(log2 n) + 1` of them (Sturges), capped.
#[must_use]
pub fn histogram_bins(values: &[f64]) -> Vec<HistogramBin> {
    let values = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let bin_count = ((values.len() as f64).log2().ceil() as usize + 1).clamp(1, MAX_HISTOGRAM_BINS);
    let width = (max - min) / bin_count as f64;
    let mut bins = (0..bin_count)
        .map(|index| HistogramBin {
            lower: min + width * index as f64,
            upper: if index + 1 == bin_count {
                max
            } else {
                min + width * (index + 1) as f64
            },
            count: 0,
        })
        .collect::<Vec<_>>();
    for value in values {
        let index = (((value - min) / width) as usize).min(bin_count - 1);
        bins[index].count += 1;
    }
    bins
}

/// Five-number summary with linearly interpolated quartiles.
#[must_use]
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    Some(BoxStats {
        count: sorted.len(),
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

fn quantile(sorted: &[f64], fraction: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * fraction;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::{ChartView, box_stats, histogram_bins, plan_charts};
    use crate::models::{Cell, ResultSet};

    fn result(columns: &[&str], rows: Vec<Vec<Cell>>) -> ResultSet {
        ResultSet::new(
            columns.iter().map(ToString::to_string).collect(),
            rows,
            false,
        )
    }

    fn kinds(result: &ResultSet) -> Vec<&'static str> {
        plan_charts(result)
            .views
            .iter()
            .map(|view| match view {
                ChartView::Map { .. } => "map",
                ChartView::Histogram { .. } => "histogram",
                ChartView::Scatter { .. } => "scatter",
                ChartView::BoxStats { .. } => "box",
                ChartView::DepthProfile { .. } => "profile",
            })
            .collect()
    }

    #[test]
    fn full_measurement_rows_get_every_view() {
        let rows = result(
            &[
                "platform_number",
                "latitude",
                "longitude",
                "pressure",
                "temperature",
                "salinity",
            ],
            vec![
                vec![
                    Cell::Text("4903660".to_string()),
                    Cell::Real(4.5),
                    Cell::Real(72.0),
                    Cell::Real(0.0),
                    Cell::Real(29.0),
                    Cell::Real(35.0),
                ],
                vec![
                    Cell::Text("6990514".to_string()),
                    Cell::Real(1.0),
                    Cell::Real(80.0),
                    Cell::Real(50.0),
                    Cell::Real(30.5),
                    Cell::Real(35.5),
                ],
            ],
        );
        assert_eq!(
            kinds(&rows),
            vec![
                "map",
                "histogram",
                "scatter",
                "histogram",
                "scatter",
                "profile"
            ]
        );

        let plan = plan_charts(&rows);
        let ChartView::Map { points, .. } = &plan.views[0] else {
            panic!("first view should be the map");
        };
        assert_eq!(points[0].marker_size, Some(10.0));
        assert_eq!(points[1].marker_size, Some(25.0));

        let ChartView::DepthProfile { series, .. } = &plan.views[5] else {
            panic!("last view should be the depth profile");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Float 4903660");
        assert_eq!(series[1].points, vec![[30.5, 50.0]]);
    }

    #[test]
    fn temperature_without_pressure_uses_box_stats() {
        let rows = result(
            &["temperature"],
            vec![vec![Cell::Real(29.0)], vec![Cell::Real(31.0)]],
        );
        assert_eq!(kinds(&rows), vec!["histogram", "box"]);
    }

    #[test]
    fn salinity_without_temperature_uses_box_stats() {
        let rows = result(&["salinity"], vec![vec![Cell::Real(35.0)]]);
        assert_eq!(kinds(&rows), vec!["histogram", "box"]);
    }

    #[test]
    fn map_needs_both_coordinates_and_skips_missing_ones() {
        let rows = result(&["latitude"], vec![vec![Cell::Real(1.0)]]);
        assert!(plan_charts(&rows).is_empty());

        let rows = result(
            &["latitude", "longitude"],
            vec![
                vec![Cell::Null, Cell::Real(70.0)],
                vec![Cell::Real(2.0), Cell::Real(71.0)],
            ],
        );
        let plan = plan_charts(&rows);
        let ChartView::Map { points, .. } = &plan.views[0] else {
            panic!("expected map");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].marker_size, None);
    }

    #[test]
    fn empty_results_plan_nothing() {
        let rows = result(&["temperature", "pressure"], Vec::new());
        assert!(plan_charts(&rows).is_empty());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [29.0, 29.5, 30.0, 30.0, 31.0];
        let bins = histogram_bins(&values);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 5);
        assert_eq!(bins[0].lower, 29.0);
        assert_eq!(bins[3].upper, 31.0);

        let single = histogram_bins(&[3.0, 3.0]);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].count, 2);
    }

    #[test]
    fn box_stats_interpolate_quartiles() {
        let stats = box_stats(&[5.0, 1.0, 3.0, 2.0, 4.0]).expect("stats");
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.max, 5.0);
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn plans_serialize_with_kind_tags() {
        let rows = result(&["temperature"], vec![vec![Cell::Real(29.0)]]);
        let encoded = serde_json::to_value(plan_charts(&rows)).expect("plan should serialize");
        assert_eq!(encoded["views"][0]["kind"], "histogram");
        assert_eq!(encoded["views"][1]["kind"], "box_stats");
        assert_eq!(encoded["views"][1]["stats"]["median"], 29.0);
    }
}
