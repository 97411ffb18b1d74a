//! Runs the stages for every source and reports each one on its own.
//!
//! A failing source does not stop the others from being read, parsed,
//! normalized and aggregated. Only the merge needs all three series.

use crate::aggregator::{to_monthly, Reduction};
use crate::analyzer::{add_derived, PanelSummary};
use crate::config::AppConfig;
use crate::merger::merge;
use crate::model::{MergeError, MonthlySeries, Panel, SourceKind};
use crate::normalizer::normalize_with_stats;
use crate::parser::Parser;
use crate::serializer::{serialize, PanelRecord};
use crate::source::{SourceReader, SourceRequest};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Parse,
    Normalize,
    Aggregate,
    Merge,
    Derive,
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Parse => "parse",
            Stage::Normalize => "normalize",
            Stage::Aggregate => "aggregate",
            Stage::Merge => "merge",
            Stage::Derive => "derive",
            Stage::Serialize => "serialize",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Success(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: Stage,
    /// `None` for stages that work on all sources at once.
    pub source: Option<SourceKind>,
    pub outcome: StageOutcome,
}

impl StageReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StageOutcome::Success(_))
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.source.map(|s| s.to_string()).unwrap_or_else(|| "panel".into());
        match &self.outcome {
            StageOutcome::Success(detail) => write!(f, "[{scope}/{}] ok: {detail}", self.stage),
            StageOutcome::Failed(reason) => write!(f, "[{scope}/{}] FAILED: {reason}", self.stage),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("merge: cannot build the panel without the {} source(s)", join_kinds(.0))]
    MissingSource(Vec<SourceKind>),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

fn join_kinds(kinds: &[SourceKind]) -> String {
    kinds.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
}

pub struct PanelOutput {
    pub panel: Panel,
    pub records: Vec<PanelRecord>,
    pub summary: PanelSummary,
}

pub struct PipelineOutcome {
    pub reports: Vec<StageReport>,
    pub result: Result<PanelOutput, PipelineError>,
}

impl PipelineOutcome {
    pub fn failed_stages(&self) -> impl Iterator<Item = &StageReport> {
        self.reports.iter().filter(|r| !r.is_success())
    }
}

pub fn reduction_for(kind: SourceKind) -> Reduction {
    match kind {
        SourceKind::Price | SourceKind::Rate => Reduction::Mean,
        SourceKind::Search => Reduction::Passthrough,
    }
}

/// Merge plus derived metrics: the part of the pipeline that needs no I/O.
pub fn build_panel(
    price: &MonthlySeries,
    rate: &MonthlySeries,
    search: &MonthlySeries,
) -> Result<Panel, MergeError> {
    let merged = merge(price, rate, search)?;
    Ok(add_derived(&merged))
}

struct Recorder {
    reports: Vec<StageReport>,
}

impl Recorder {
    fn ok(&mut self, stage: Stage, source: Option<SourceKind>, detail: String) {
        info!("{}/{} done: {}", source.map(|s| s.to_string()).unwrap_or_else(|| "panel".into()), stage, detail);
        self.reports.push(StageReport { stage, source, outcome: StageOutcome::Success(detail) });
    }

    fn failed(&mut self, stage: Stage, source: Option<SourceKind>, reason: String) {
        let report = StageReport { stage, source, outcome: StageOutcome::Failed(reason) };
        error!("{}", report);
        self.reports.push(report);
    }
}

fn process_source<R: SourceReader, P: Parser>(
    kind: SourceKind,
    config: &AppConfig,
    reader: &R,
    parser: &P,
    rec: &mut Recorder,
) -> Option<MonthlySeries> {
    let source_cfg = config.sources.get(kind);
    let request = SourceRequest { kind, path: source_cfg.path.clone() };

    let text = match reader.read(&request) {
        Ok(text) => {
            rec.ok(Stage::Read, Some(kind), format!("{} bytes", text.len()));
            text
        }
        Err(e) => {
            rec.failed(Stage::Read, Some(kind), e.to_string());
            return None;
        }
    };

    let rows = match parser.parse(&text) {
        Ok(rows) => {
            rec.ok(Stage::Parse, Some(kind), format!("{} rows", rows.len()));
            rows
        }
        Err(e) => {
            rec.failed(Stage::Parse, Some(kind), e.to_string());
            return None;
        }
    };

    let (observations, dropped) = normalize_with_stats(&rows, &source_cfg.fields(), &config.window());
    rec.ok(
        Stage::Normalize,
        Some(kind),
        format!("{} observations kept, {} rows dropped", observations.len(), dropped.total()),
    );

    let series = to_monthly(&observations, reduction_for(kind));
    if series.is_empty() {
        warn!("{} source has no observations between {} and {}", kind, config.start_date, config.end_date);
    }
    rec.ok(Stage::Aggregate, Some(kind), series.coverage());

    Some(series)
}

pub fn run<R: SourceReader, P: Parser>(config: &AppConfig, reader: &R, parser: &P) -> PipelineOutcome {
    let mut rec = Recorder { reports: Vec::new() };
    let mut series: BTreeMap<SourceKind, MonthlySeries> = BTreeMap::new();

    for kind in SourceKind::ALL {
        if let Some(s) = process_source(kind, config, reader, parser, &mut rec) {
            series.insert(kind, s);
        }
    }

    let missing: Vec<SourceKind> = SourceKind::ALL
        .into_iter()
        .filter(|k| !series.contains_key(k))
        .collect();

    let result = match (
        series.get(&SourceKind::Price),
        series.get(&SourceKind::Rate),
        series.get(&SourceKind::Search),
    ) {
        (Some(price), Some(rate), Some(search)) => match build_panel(price, rate, search) {
            Ok(panel) => {
                // Deriving keeps every merged row, so one count serves both stages.
                rec.ok(Stage::Merge, None, format!("{} common months", panel.len()));
                rec.ok(Stage::Derive, None, format!("{} rows", panel.len()));
                let records = serialize(&panel);
                rec.ok(Stage::Serialize, None, format!("{} records", records.len()));
                let summary = PanelSummary::from_panel(&panel, config.smoothing_window);
                Ok(PanelOutput { panel, records, summary })
            }
            Err(e) => {
                rec.failed(Stage::Merge, None, e.to_string());
                Err(PipelineError::from(e))
            }
        },
        _ => {
            let err = PipelineError::MissingSource(missing);
            rec.failed(Stage::Merge, None, err.to_string());
            Err(err)
        }
    };

    PipelineOutcome { reports: rec.reports, result }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::parser::CsvParser;
    use crate::source::MemoryReader;

    const CONFIG: &str = r#"{
        "start_date": "2020-01-01",
        "end_date": "2020-12-31",
        "sources": {
            "price":  { "path": "price.csv", "date_field": "prev_sold_date", "value_field": "price", "category_field": "state" },
            "rate":   { "path": "rate.csv", "date_field": "date", "value_field": "value" },
            "search": { "path": "search.csv", "date_field": "date", "value_field": "homes for sale" }
        },
        "smoothing_window": 2
    }"#;

    const PRICE: &str = "prev_sold_date,price,state\n\
        2020-01-05,290000,Ohio\n\
        01/20/2020,310000,Ohio\n\
        2020-02-11,310000,Texas\n\
        bogus,1,Ohio\n\
        2019-12-30,999999,Ohio\n";
    const RATE: &str = "date,value\n2020-01-02,3.4\n2020-01-09,3.6\n2020-02-06,3.6\n2020-03-05,.\n";
    const SEARCH: &str = "date,homes for sale,isPartial\n2020-01-01,50,False\n2020-02-01,55,False\n2020-03-01,60,True\n";

    fn reader() -> MemoryReader {
        MemoryReader::new()
            .with_file("price.csv", PRICE)
            .with_file("rate.csv", RATE)
            .with_file("search.csv", SEARCH)
    }

    #[test]
    fn full_run_builds_panel_and_reports_every_stage() {
        let config = parse_config(CONFIG).unwrap();
        let outcome = run(&config, &reader(), &CsvParser::new());

        assert_eq!(outcome.failed_stages().count(), 0);
        // 4 per source + merge, derive, serialize
        assert_eq!(outcome.reports.len(), 15);

        let output = outcome.result.unwrap();
        assert_eq!(output.records.len(), 2);
        let feb = &output.records[1];
        assert_eq!(feb.month, "02/01/2020");
        assert_eq!(feb.avg_price, 310000.0);
        assert_eq!(feb.price_pct_change, Some(3.3));
        assert_eq!(feb.mortgage_pct_change, Some(2.9));
        assert_eq!(feb.search_pct_change, Some(10.0));
        assert_eq!(output.summary.smoothed.len(), 1);
    }

    #[test]
    fn run_panel_matches_build_panel_on_aggregated_series() {
        let config = parse_config(CONFIG).unwrap();
        let outcome = run(&config, &reader(), &CsvParser::new());
        let output = outcome.result.unwrap();

        let series: Vec<MonthlySeries> = SourceKind::ALL
            .into_iter()
            .map(|kind| {
                let source_cfg = config.sources.get(kind);
                let text = reader().read(&SourceRequest { kind, path: source_cfg.path.clone() }).unwrap();
                let rows = CsvParser::new().parse(&text).unwrap();
                let (obs, _) = normalize_with_stats(&rows, &source_cfg.fields(), &config.window());
                to_monthly(&obs, reduction_for(kind))
            })
            .collect();
        let expected = build_panel(&series[0], &series[1], &series[2]).unwrap();
        assert_eq!(output.panel.rows(), expected.rows());

        let derive_reports = outcome.reports.iter().filter(|r| r.stage == Stage::Derive).count();
        assert_eq!(derive_reports, 1);
    }

    #[test]
    fn missing_source_still_processes_the_others() {
        let config = parse_config(CONFIG).unwrap();
        let partial = MemoryReader::new().with_file("price.csv", PRICE).with_file("search.csv", SEARCH);
        let outcome = run(&config, &partial, &CsvParser::new());

        let failed: Vec<_> = outcome.failed_stages().collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].stage, Stage::Read);
        assert_eq!(failed[0].source, Some(SourceKind::Rate));
        assert_eq!(failed[1].stage, Stage::Merge);

        let search_done = outcome
            .reports
            .iter()
            .any(|r| r.source == Some(SourceKind::Search) && r.stage == Stage::Aggregate && r.is_success());
        assert!(search_done);

        match outcome.result {
            Err(PipelineError::MissingSource(kinds)) => assert_eq!(kinds, vec![SourceKind::Rate]),
            _ => panic!("expected MissingSource"),
        }
    }

    #[test]
    fn misaligned_window_surfaces_empty_intersection() {
        let config = parse_config(&CONFIG.replace("2020-01-01", "2021-01-01").replace("2020-12-31", "2021-12-31")).unwrap();
        let outcome = run(&config, &reader(), &CsvParser::new());
        let err = outcome.result.err().unwrap();
        assert!(matches!(err, PipelineError::Merge(MergeError::EmptyIntersection { .. })));
        assert!(err.to_string().starts_with("merge:"));
    }

    #[test]
    fn report_display_names_source_and_stage() {
        let report = StageReport {
            stage: Stage::Parse,
            source: Some(SourceKind::Price),
            outcome: StageOutcome::Failed("missing header row".into()),
        };
        assert_eq!(report.to_string(), "[price/parse] FAILED: missing header row");
    }
}
