// src/lib.rs

//! Seeker library: discovers linked profiles by following identifiers.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
