//! Core config, errors, and wire types for Treasure Hunt.

pub mod config;
pub mod error;
pub mod types;
