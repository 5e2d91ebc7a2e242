pub mod builder;
pub mod filter;
pub mod types;
