//! # radar-synth — Synthetic Datasets
//!
//! Produces reproducible test and demo data for PolicyRadar and moves it
//! to and from disk.
//!
//! - [`SyntheticGenerator`] draws policies, change history, companies with
//!   profiles and quarterly financials, daily prices and quarterly macro
//!   indicators from one seeded RNG, then runs the impact engine over
//!   matching (policy, company) pairs.
//! - [`write_dir`] exports JSON for every set plus CSV for the tabular
//!   ones, with a `generation_summary.json`.
//! - [`Dataset::load_dir`] reads an exported directory back and validates
//!   every record.

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod generator;

pub use config::GeneratorConfig;
pub use dataset::{read_summary, Dataset, DatasetSummary, SET_NAMES, SUMMARY_FILE};
pub use error::SynthError;
pub use export::write_dir;
pub use generator::SyntheticGenerator;
