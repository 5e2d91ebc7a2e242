//! Live database investigation: listing and describing tables, tracing where
//! values live, and checking candidate keys.

pub mod config;
pub mod features;
pub mod metadata;
pub mod origin;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod report;
pub mod source;
pub mod sql;
pub mod trace;
pub mod uniqueness;
