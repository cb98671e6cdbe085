// src/aggregate/mod.rs

pub mod period;
pub mod rollup;
