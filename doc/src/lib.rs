//! YAML front end for overlay entry matching.
//!
//! This crate feeds real documents into `overlay-match-core`:
//!
//! - [`Document`] loads a base YAML document into the node model and
//!   selects the mapping to match against.
//! - [`MatchRequest`] is the YAML request file listing new entries, their
//!   `overlay/match` options and shared defaults.
//! - [`run_request`] matches every entry and produces a [`MatchReport`].
//!
//! # Quick start
//!
//! ```no_run
//! use overlay_match_core::{Comparators, FunctionTable, MatchContext};
//! use overlay_match_doc::{Document, MatchRequest, RunOptions, run_request};
//!
//! let doc = Document::load("base.yml").unwrap();
//! let request = MatchRequest::load("request.yml").unwrap();
//!
//! let evaluator = FunctionTable::new();
//! let comparators = Comparators::new().with_map_key_fallback();
//! let ctx = MatchContext::new(&evaluator, &comparators);
//!
//! let report = run_request(&doc, &request, &ctx, &RunOptions::default()).unwrap();
//! println!("{}", report.to_json().unwrap());
//! ```

mod document;
mod error;
mod report;
mod request;
mod runner;

pub use document::{Document, to_node};
pub use error::{DocumentError, Result};
pub use report::{EntryOutcome, ErrorReport, MatchReport, REPORT_VERSION};
pub use request::{CALLABLE_TAG, MatchRequest, RequestEntry, to_arg};
pub use runner::{REQUEST_LABEL, RunOptions, run_request};
