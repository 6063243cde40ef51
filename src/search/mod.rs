//! Query parsing, the search state machine, and result delivery.

pub mod engine;
pub mod query;
pub mod query_node;
pub mod results;

pub use engine::{Search, SearchOptions, SearchStatus};
pub use query::{ParenthesisTracker, Query};
pub use query_node::{BoolOp, MatchInfo, MatchSpan, QueryLeaf, QueryNode};
pub use results::{LineRef, Results, SearchIterator};

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
