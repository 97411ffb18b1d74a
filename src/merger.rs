use crate::model::{MergeError, MonthlySeries, Panel, PanelRow};
use tracing::info;

/// Inner join of the three monthly series on the month key.
///
/// Only months present in all three survive; an empty result is an error
/// because it means the sources or the window are misaligned.
pub fn merge(
    price: &MonthlySeries,
    rate: &MonthlySeries,
    search: &MonthlySeries,
) -> Result<Panel, MergeError> {
    let rows: Vec<PanelRow> = price
        .points()
        .iter()
        .filter_map(|p| {
            let mortgage_rate = rate.get(p.month)?;
            let search_interest = search.get(p.month)?;
            Some(PanelRow::new(p.month, p.value, mortgage_rate, search_interest))
        })
        .collect();

    if rows.is_empty() {
        return Err(MergeError::EmptyIntersection {
            price: price.coverage(),
            rate: rate.coverage(),
            search: search.coverage(),
        });
    }

    info!(
        "Merged {} common months (price: {}, rate: {}, search: {})",
        rows.len(),
        price.len(),
        rate.len(),
        search.len()
    );

    Ok(Panel::from_rows(rows))
}
