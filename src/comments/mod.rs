//! Threaded comment handling

pub mod cursor;
pub mod tree;

pub use cursor::ReplyCursor;
pub use tree::{CommentTree, FlatEntry, NodeId, ThreadItem};
