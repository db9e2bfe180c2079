// Forum migrator - engine core
//
// Moves users, groups, categories, threads, posts and attachments out of a
// legacy forum's Postgres schema into the target forum's schema, preserving
// ids, timestamps and hierarchy. The engine talks to both sides through
// narrow trait contracts (see source/ and store/), so the actual forum
// software on either end stays out of this crate.

pub mod config;
pub mod error;
pub mod migrate;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
