/// Forecast CSV export.
pub mod export;
/// Persisted readings file.
pub mod store;
/// Annual consumption totals.
pub mod totals;

pub use store::StoreError;
