pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod digest;
pub mod edit;
pub mod error;
pub mod listing;
pub mod preview;
pub mod removal;
pub mod tool;
