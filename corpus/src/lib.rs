//! Build conversational training packs from archived forum logs.
//!
//! Stages run strictly in order: [`ingest`] (with [`normalize`]), [`filter`],
//! [`links`], [`windows`], [`assemble`], [`pack_writer`]. [`pipeline`] wires
//! them together.

pub mod assemble;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod links;
pub mod normalize;
pub mod pack_writer;
pub mod pipeline;
pub mod windows;

pub use replypack_types as types;
