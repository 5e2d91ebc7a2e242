pub mod catalog;
pub mod cli;
pub mod convert;
pub mod crawl;
pub mod error;
pub mod graph;
pub mod investigator;
pub mod logging;
pub mod render;
