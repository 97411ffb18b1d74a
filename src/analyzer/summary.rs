use crate::analyzer::market_indicators::{LinearFit, MarketAnalyzer};
use crate::model::{Panel, StorageError};
use crate::utils::format_us_date;
use serde::Serialize;
use std::io::Write;

/// Metric order used by the correlation matrix.
pub const METRICS: [&str; 3] = ["avg_price", "mortgage_rate", "search_interest"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedPoint {
    /// Last month of the averaging window.
    pub month: String,
    pub avg_price: f64,
    pub mortgage_rate: f64,
    pub search_interest: f64,
}

/// Numbers behind the charts: correlations, trend lines and smoothed series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSummary {
    pub first_month: Option<String>,
    pub last_month: Option<String>,
    pub months: usize,
    pub metrics: [&'static str; 3],
    /// `correlation[i][j]` between `metrics[i]` and `metrics[j]`; `None` when a
    /// metric is constant.
    pub correlation: [[Option<f64>; 3]; 3],
    pub search_vs_mortgage: Option<LinearFit>,
    pub search_vs_price: Option<LinearFit>,
    pub smoothing_window: usize,
    pub smoothed: Vec<SmoothedPoint>,
}

impl PanelSummary {
    pub fn from_panel(panel: &Panel, smoothing_window: usize) -> Self {
        let rows = panel.rows();
        let price: Vec<f64> = rows.iter().map(|r| r.avg_price).collect();
        let rate: Vec<f64> = rows.iter().map(|r| r.mortgage_rate).collect();
        let search: Vec<f64> = rows.iter().map(|r| r.search_interest).collect();
        let columns = [&price, &rate, &search];

        let mut correlation = [[None; 3]; 3];
        for (i, a) in columns.iter().enumerate() {
            for (j, b) in columns.iter().enumerate() {
                correlation[i][j] = MarketAnalyzer::compute_correlation(a, b);
            }
        }

        let smooth_price = MarketAnalyzer::moving_average(&price, smoothing_window);
        let smooth_rate = MarketAnalyzer::moving_average(&rate, smoothing_window);
        let smooth_search = MarketAnalyzer::moving_average(&search, smoothing_window);
        let smoothed = rows
            .iter()
            .skip(smoothing_window.saturating_sub(1))
            .zip(smooth_price.iter().zip(smooth_rate.iter().zip(smooth_search.iter())))
            .map(|(row, (p, (r, s)))| SmoothedPoint {
                month: format_us_date(row.month),
                avg_price: *p,
                mortgage_rate: *r,
                search_interest: *s,
            })
            .collect();

        Self {
            first_month: rows.first().map(|r| format_us_date(r.month)),
            last_month: rows.last().map(|r| format_us_date(r.month)),
            months: rows.len(),
            metrics: METRICS,
            correlation,
            search_vs_mortgage: MarketAnalyzer::linear_fit(&search, &rate),
            search_vs_price: MarketAnalyzer::linear_fit(&search, &price),
            smoothing_window,
            smoothed,
        }
    }
}

pub fn write_summary<W: Write>(mut writer: W, summary: &PanelSummary) -> Result<(), StorageError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::merge;
    use crate::model::MonthlySeries;
    use chrono::NaiveDate;

    fn panel(n: u32) -> Panel {
        let build = |f: &dyn Fn(f64) -> f64| {
            MonthlySeries::from_points(
                (1..=n).map(|i| (NaiveDate::from_ymd_opt(2021, i, 1).unwrap(), f(i as f64))),
            )
            .unwrap()
        };
        merge(
            &build(&|i: f64| 300000.0 + 1000.0 * i),
            &build(&|i: f64| 7.0 - 0.25 * i),
            &build(&|i: f64| 40.0 + 2.0 * i),
        )
        .unwrap()
    }

    #[test]
    fn correlations_and_trend_lines() {
        let summary = PanelSummary::from_panel(&panel(6), 3);
        assert_eq!(summary.months, 6);
        assert_eq!(summary.first_month.as_deref(), Some("01/01/2021"));
        assert_eq!(summary.last_month.as_deref(), Some("06/01/2021"));

        let price_rate = summary.correlation[0][1].unwrap();
        let price_search = summary.correlation[0][2].unwrap();
        assert!((price_rate + 1.0).abs() < 1e-9);
        assert!((price_search - 1.0).abs() < 1e-9);
        assert_eq!(summary.correlation[1][0], summary.correlation[0][1]);

        let fit = summary.search_vs_price.unwrap();
        assert!((fit.slope - 500.0).abs() < 1e-6);
        assert!(summary.search_vs_mortgage.unwrap().slope < 0.0);
    }

    #[test]
    fn smoothed_points_labelled_by_window_end() {
        let summary = PanelSummary::from_panel(&panel(6), 3);
        assert_eq!(summary.smoothed.len(), 4);
        assert_eq!(summary.smoothed[0].month, "03/01/2021");
        assert!((summary.smoothed[0].avg_price - 302000.0).abs() < 1e-6);
        assert_eq!(summary.smoothed[3].month, "06/01/2021");
    }

    #[test]
    fn short_panel_has_no_smoothed_series() {
        let summary = PanelSummary::from_panel(&panel(2), 6);
        assert!(summary.smoothed.is_empty());
    }

    #[test]
    fn writes_json() {
        let summary = PanelSummary::from_panel(&panel(3), 2);
        let mut buf = Vec::new();
        write_summary(&mut buf, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["months"], 3);
        assert_eq!(value["metrics"][2], "search_interest");
        assert_eq!(value["smoothed"].as_array().unwrap().len(), 2);
    }
}
