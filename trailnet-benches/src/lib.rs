//! Benchmark support crate for trailnet.
//!
//! Provides seeded synthetic experiments and parameter types used by the
//! Criterion benchmarks for mesh construction and the full pipeline.

pub mod params;
pub mod scenario;
