pub mod archive;
pub mod audit;
pub mod config;
pub mod date;
pub mod document;
pub mod format;
pub mod merge;
pub mod paths;
pub mod store;
