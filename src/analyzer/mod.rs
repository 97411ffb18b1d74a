// Analyzer module: derived change metrics and the statistics handed to charts.

pub mod derived;
pub mod market_indicators;
pub mod summary;

pub use derived::add_derived;
pub use summary::PanelSummary;
