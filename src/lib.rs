#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for sdk-harvest
//!
//! This library gathers release metadata for SDKs from a registry of pluggable collectors
//! and publishes the normalized results to a GitHub repository used as a blob store.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and run-mode selection
//! - [`harvest`]: Collector registry, bounded dispatch queue, worker pool and orchestration
//! - [`publish`]: Change ledger, homepage index and the publish pipeline
//! - [`store`]: Remote content store client (contents and releases endpoints)
//! - [`collectors`]: Built-in configuration-driven collectors

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod collectors;
pub mod commands;
pub mod harvest;
pub mod publish;
pub mod store;

pub use crate::commands::{Host, run};
