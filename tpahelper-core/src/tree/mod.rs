//! Nested packet records and wildcard search over them.
//!
//! - [`Node`] - one decoded packet as a key/value tree (document order,
//!   duplicate keys kept)
//! - [`PathPattern`] - compiled `/`-separated pattern with `*`, `?` and `**`
//! - [`TreeMatcher`] - pre-order depth-first search returning `(path, value)`
//!   pairs
//!
//! The matcher knows nothing about protocols; point processors build on it.
//!
//! ## Example
//!
//! ```rust
//! use tpahelper_core::tree::{Node, TreeMatcher};
//!
//! let packet: Node = serde_json::from_str(
//!     r#"{"layers": {"dnp3": {"dnp3.al.index": "4", "dnp3.al.ana.int": "17"}}}"#,
//! ).unwrap();
//!
//! let matches = TreeMatcher::field("dnp3.al.index").search(&packet);
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].path.to_string(), "layers/dnp3/dnp3.al.index");
//! ```

mod matcher;
mod node;
mod pattern;

pub use matcher::{Match, MatchPath, TreeMatcher};
pub use node::Node;
pub use pattern::{PathPattern, Segment, SEPARATOR};
