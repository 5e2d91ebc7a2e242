pub mod attributes;
pub mod crawl_info;
pub mod document;
pub mod filter;
pub mod loader;
pub mod types;
