use crate::model::{MonthlySeries, RawObservation};
use crate::utils::month_start;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

/// How observations sharing a calendar month collapse into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean; per-sale prices and weekly rates.
    Mean,
    /// The source already delivers one value per month. More than one value
    /// in a month falls back to the mean.
    Passthrough,
}

#[derive(Default)]
struct Bucket {
    sum: f64,
    count: usize,
}

pub fn to_monthly(observations: &[RawObservation], reduction: Reduction) -> MonthlySeries {
    let mut grouped: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for obs in observations {
        let entry = grouped.entry(month_start(obs.timestamp)).or_default();
        entry.sum += obs.value;
        entry.count += 1;
    }

    if reduction == Reduction::Passthrough {
        let crowded = grouped.values().filter(|b| b.count > 1).count();
        if crowded > 0 {
            warn!(
                "Pass-through source has {} month(s) with several observations, averaging them",
                crowded
            );
        }
    }

    MonthlySeries::from_sorted(
        grouped
            .into_iter()
            .map(|(month, bucket)| (month, bucket.sum / bucket.count as f64))
            .collect(),
    )
}
