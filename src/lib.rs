// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # orthograph
//!
//! An asynchronous text-ingestion engine that discovers orthotopes:
//! k-dimensional grids of tokens whose every axis-aligned step was observed
//! as adjacent words somewhere in the ingested text.
//!
//! ## Architecture
//!
//! - **Segmenter** (`segment`): bodies into lowercase token sentences
//! - **Dedup store** (`store`): interned sentences, pairs, chains, phrases
//! - **Graph** (`graph`): directed token graph (petgraph) plus the orthotope index
//! - **Matcher** (`matcher`): ex nihilo squares, "up" stacking, "over" extension
//! - **Queue** (`queue`): generational tasks drained by a fixed worker pool
//! - **Query** (`query`): dims filters and the text dump
//!
//! ## Library usage
//!
//! ```no_run
//! use std::time::Duration;
//! use orthograph::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! engine.add("square", "a b. c d. a c. b d").unwrap();
//! engine.wait_idle(Duration::from_secs(5));
//! assert_eq!(engine.ortho_count_query("1,1").unwrap(), 1);
//! println!("{}", engine.splat("1,1").unwrap());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod id;
pub mod matcher;
pub mod ortho;
pub mod query;
pub mod queue;
pub mod segment;
pub mod store;
pub mod vocab;
mod worker;
