use crate::model::{Change, Direction, Panel, PanelRow};
use crate::utils::round_one_decimal;

/// Percentage change from `previous` to `current`, rounded to one decimal.
///
/// `None` when there is nothing sensible to compare against: a zero previous
/// value, or a result that does not fit in a finite float.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let pct = round_one_decimal((current - previous) / previous * 100.0);
    pct.is_finite().then_some(pct)
}

/// Sign of an already rounded percentage change.
pub fn classify(pct_change: f64) -> Direction {
    if pct_change > 0.0 {
        Direction::Up
    } else if pct_change < 0.0 {
        Direction::Down
    } else {
        Direction::Flat
    }
}

fn change(previous: f64, current: f64) -> Option<Change> {
    pct_change(previous, current).map(|pct| Change {
        pct_change: pct,
        direction: classify(pct),
    })
}

/// Returns a copy of `panel` with month-over-month changes filled in.
/// The first row keeps `None` for every metric.
pub fn add_derived(panel: &Panel) -> Panel {
    let rows = panel.rows();
    let mut derived = Vec::with_capacity(rows.len());

    if let Some(first) = rows.first() {
        derived.push(PanelRow {
            price_change: None,
            mortgage_change: None,
            search_change: None,
            ..first.clone()
        });
    }

    for w in rows.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        derived.push(PanelRow {
            price_change: change(prev.avg_price, cur.avg_price),
            mortgage_change: change(prev.mortgage_rate, cur.mortgage_rate),
            search_change: change(prev.search_interest, cur.search_interest),
            ..cur.clone()
        });
    }

    Panel::from_rows(derived)
}
