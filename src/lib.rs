//! `haproxy-stats` reads HAProxy's `show stat` CSV, from the admin stats socket or a saved
//! dump, into typed [`types::Record`]s.
//!
//! The primary entrypoint is [`ingestion::collect`], which takes a [`ingestion::StatsSource`]
//! (`unix:/path`, `tcp:host:port` or a file path) and a [`ingestion::StatsOptions`].
//!
//! ## Decoding rules
//!
//! - Source columns are renamed and typed through a [`fields::FieldDictionary`]. The default
//!   dictionary covers the documented stat columns (`pxname` → `proxy`, `svname` → `name`,
//!   `qcur` → `currentQueued`, `hrsp_5xx` → `httpResponse5xx`, ...).
//! - Columns missing from the dictionary, and numbers that fail to parse, are left out of the
//!   record. [`types::Record::string`] / [`types::Record::int`] return `""` / `0` for them.
//! - The trailing column of every row is dropped.
//! - Each record then runs through the options' transforms, in registration order.
//! - A malformed row fails the whole decode; nothing is returned partially.
//!
//! ## Quick example
//!
//! ```rust
//! use haproxy_stats::fields::{Field, FieldDictionary};
//! use haproxy_stats::ingestion::{decode_from_reader, StatsOptions};
//!
//! let mut opts = StatsOptions::default();
//! opts.set_field_dictionary(
//!     FieldDictionary::empty()
//!         .with_field("svname", Field::text("name"))
//!         .with_field("pxname", Field::text("proxy"))
//!         .with_field("qcur", Field::number("currentQueued")),
//! );
//! opts.register_transform(|r| {
//!     let id = format!("{}/{}", r.string("proxy"), r.string("name"));
//!     r.with("id", id)
//! });
//!
//! let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,IGNORED\n";
//! let records = decode_from_reader(input.as_bytes(), &opts).unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records.records[0].string("id"), "frontend/web1");
//! assert_eq!(records.records[0].int("currentQueued"), 5);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: decoding, transports, unified entrypoint and observers
//! - [`fields`]: field kinds and the column dictionary
//! - [`types`]: records and values
//! - [`processing`]: transform chain, filter and reduce
//! - [`error`]: error types

pub mod error;
pub mod fields;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{StatsError, StatsResult};
