//! readme-lens - README translation for installed editor extensions
//!
//! Reads an extension's README, translates it through a generative model
//! when a credential is configured (falling back to placeholder-protected
//! machine translation), and renders it next to the original.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod panel;
pub mod render;
pub mod translate;
pub mod workflow;
