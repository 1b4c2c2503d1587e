//! Terminal rendering of a loaded provider

pub mod chart;
pub mod export;
pub mod setup;
pub mod summary;
pub mod table;
pub mod ui;
