// src/services/mod.rs
pub mod ad_generation;

pub use ad_generation::{AdGenerationService, GenerationError};
