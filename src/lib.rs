//! Library interface for the beer cellar tracker
//!
//! The cellar is a row of eight storage boxes. Each box holds bottles of one
//! size, kept in drink-by order. The library decides which box a new bottle
//! goes into, lists what is due, applies drinks reported by Untappd and
//! persists everything as plain `~`-delimited text files.

pub mod beer;
pub mod beer_cellar;
pub mod cellar;
pub mod config;
pub mod error;
pub mod names;
pub mod untappd;

// Re-export commonly used types
pub use beer::{Beer, BeerSize};
pub use beer_cellar::{BeerCellar, Credentials, Interval};
pub use cellar::{CellarBox, Change, InsertCost, Rejection};
pub use error::{CellarError, Result};
pub use names::NameCache;
pub use untappd::UntappdClient;
