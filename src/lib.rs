//! Backend for an anonymous question board, stored as one JSON document
//! replicated over a primary and a backup.
//!
//! Every operation reads the whole document, changes it in memory and writes
//! the whole document back. Reads fall back to the backup (healing the
//! primary in the background) and writes succeed when either replica takes
//! them.
//!
//! ```rust,no_run
//! use qboard::{Board, ReplicatedStore};
//!
//! # async fn demo() -> qboard::Result<()> {
//! let board = Board::new(ReplicatedStore::in_memory());
//! let q = board.create("Why is the sky blue?").await?;
//! board.mutate(&q.id, "upvote").await?;
//! assert_eq!(board.list().await?[0].votes, 1);
//! # Ok(())
//! # }
//! ```
//!
//! **Last writer wins.** Two requests racing through read-modify-write on the
//! same document can silently drop one of the updates.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod config;
pub mod error;
pub mod http;
pub mod persist;
pub mod record;
pub mod replica;
pub mod serializer;
pub mod server;
pub mod store;

pub use board::Board;
pub use config::Config;
pub use error::{Error, Result};
pub use record::{Action, Document, Record};
pub use replica::{Fault, FileReplica, HttpReplica, MemoryReplica, Replica};
pub use store::{ReplicatedStore, ReplicatedStoreBuilder};
