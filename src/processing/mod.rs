//! Record transformations and queries.
//!
//! - [`transform`]: the ordered [`TransformChain`] applied to every record while decoding
//! - [`filter()`]: record filtering by predicate
//! - [`reduce()`]: count/sum/min/max over one integer key
//!
//! ## Example: filter → reduce
//!
//! ```rust
//! use haproxy_stats::processing::{filter, reduce, ReduceOp};
//! use haproxy_stats::types::{Record, RecordSet};
//!
//! let records = RecordSet::new(vec![
//!     Record::new().with("name", "FRONTEND").with("currentSessions", 7),
//!     Record::new().with("name", "web1").with("currentSessions", 3),
//!     Record::new().with("name", "web2").with("currentSessions", 4),
//! ]);
//!
//! // Keep only server rows.
//! let servers = filter(&records, |r| r.string("name") != "FRONTEND");
//!
//! let total = reduce(&servers, "currentSessions", ReduceOp::Sum);
//! assert_eq!(total, Some(7));
//! ```

pub mod filter;
pub mod reduce;
pub mod transform;

pub use filter::filter;
pub use reduce::{reduce, ReduceOp};
pub use transform::{Transform, TransformChain};
