//! Post summarization: an ordered chain of backends behind a cache-aside
//! `summary` column, with a deterministic truncation fallback.

pub mod backend;
pub mod fallback;
pub mod hf;
pub mod service;
