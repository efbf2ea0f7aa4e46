//! depclash - Dependency conflict detector library
//!
//! This library finds dependency version conflicts between plugins that
//! share one Python environment:
//! - Parses PEP 440 versions and requirement lines into constraint sets
//! - Intersects the sets of every plugin per package
//! - Classifies each package as conflict, violation, ok or unconstrained

pub mod cli;
pub mod config;
pub mod constraint;
pub mod detector;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod progress;
pub mod report;
pub mod rewrite;
pub mod scanner;
pub mod snapshot;
