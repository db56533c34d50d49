//! # unilist - Unified Adblock Filter List Generator
//!
//! Fetches filter lists written in several syntaxes (uBlock Origin, AdBlock
//! Plus, AdGuard, hosts files), normalizes every rule to canonical uBlock
//! Origin form, resolves duplicates and block/exception conflicts, and emits
//! one deterministic, sectioned output list.
//!
//! ## Features
//!
//! - **Dialect Translation** - AdGuard scriptlets, hosts entries, and ABP
//!   modifier aliases rewritten to canonical uBO syntax
//! - **Conflict Resolution** - Exception precedence, source priority, and
//!   domain-scope merging across overlapping rules
//! - **Deterministic Output** - Identical inputs always produce an identical
//!   list, independent of fetch completion order
//! - **Cached Fetching** - TTL-based download cache with stale fallback when
//!   a source is unreachable
//! - **Sectioned Lists** - Rules routed to configurable sections by type
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        unilist                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: generate, check, stats, clean-cache        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_json)                                        │
//! │    └── Sources, sections, exclude patterns, settings        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls)                                 │
//! │    └── Concurrent downloads, retries, on-disk cache         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Engine                                                     │
//! │    ├── Parser (dialect rewrite + canonical parse)           │
//! │    ├── Classifier (kind refinement + pattern normalization) │
//! │    ├── Resolver (dedup, exception precedence, scope merge)  │
//! │    └── Assembler (section routing)                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Generator                                                  │
//! │    └── Header, section banners, atomic file write           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use unilist::config::Config;
//! use unilist::dialect::SyntaxDictionary;
//! use unilist::engine::{self, SourceInput};
//! use unilist::parser::ExcludeSet;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("sources.json")?;
//!
//!     let inputs = vec![SourceInput {
//!         source: config.sources[0].descriptor(),
//!         lines: vec!["||ads.example^$third-party".to_string()],
//!     }];
//!
//!     let dict = SyntaxDictionary::new();
//!     let excludes = ExcludeSet::compile(&config.exclude_patterns)?;
//!     let output = engine::run(inputs, &config.section_specs(), &dict, &excludes)?;
//!
//!     for section in &output.sections {
//!         for line in section.lines() {
//!             println!("{}", line);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`assembler`] - Section routing for resolved rules
//! - [`classifier`] - Rule kind refinement and pattern normalization
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`dialect`] - Syntax dictionary and dialect line rewrites
//! - [`engine`] - Full pipeline orchestration
//! - [`error`] - Crate error type
//! - [`fetcher`] - HTTP client for downloading source lists
//! - [`generator`] - Output rendering and atomic file write
//! - [`parser`] - Line parsing into structured rules
//! - [`resolver`] - Conflict resolution and deduplication
//! - [`rule`] - Core rule data model
//! - [`stats`] - State persistence, statistics and display formatting

pub mod assembler;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod parser;
pub mod resolver;
pub mod rule;
pub mod stats;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::UnilistError;
