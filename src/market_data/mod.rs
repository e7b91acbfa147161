pub mod catalog;
pub mod price_table;

// Re-export the table types for convenient access (e.g. `use crate::market_data::PriceTable`).
pub use catalog::{checked_symbol, list_symbols, load_symbol, normalise_symbol};
pub use price_table::{Bar, PriceTable};
