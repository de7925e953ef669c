//! Validation Director - decides whether a generated plan is acceptable
//!
//! Runs after each generation pass, checks budget consistency and
//! logistic feasibility, and names the days that need repair.

mod review;

pub use review::{Director, Review};
