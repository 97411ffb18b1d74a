pub mod sqlite;

pub use sqlite::PanelStore;
