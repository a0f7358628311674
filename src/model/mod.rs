//! # Knowledge Graph Model
//!
//! Plain data types shared by the builder, the index, the query engine and
//! the persistence codec.
//!
//! Design rule: this module is pure data — no I/O, no locks, no async.

pub mod node;
pub mod edge;
pub mod trace;

pub use node::{Node, NodeId};
pub use edge::{Edge, EdgeKey, EdgeInsert};
pub use trace::{TraceRecord, parse_trace_log};
