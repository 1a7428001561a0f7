//! Chunked map-reduce pipeline.
//!
//! A [`ChunkTransformer`] maps every chunk through the transform capability, a
//! [`Combiner`] merges the results, and a [`CondensationLoop`] re-runs the whole
//! [`Cycle`] until its output is short enough.

mod call;
mod combiner;
mod condense;
mod mapper;

pub use call::CallPolicy;
pub use combiner::{join_flat, CombineStrategy, Combiner};
pub use condense::{CondensationLoop, Cycle};
pub use mapper::ChunkTransformer;
