//! RewardNet Core Types
//!
//! This crate defines the fundamental data structures and the fixed-point
//! arithmetic used throughout RewardNet.

mod error;
pub mod fixed;
mod types;

pub use error::*;
pub use fixed::{format_units, mul_div_round, parse_units, UNIT};
pub use types::*;
