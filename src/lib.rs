//! Axiom: Spec-to-Test Generation
//!
//! Turns a markdown document of acceptance criteria into an executable pytest module by
//! chaining four generation stages, each with a deterministic fallback.

pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod generation;
pub mod logging;
pub mod provider;
pub mod types;
pub mod verify;
