//! Core types: trees and their flamability

pub mod cell;
pub mod flamability;

pub use cell::*;
pub use flamability::{FlamabilityDistribution, FlamabilitySampler};
