//! Forwarding graph records
//!
//! A `ForwardEdge` is the atomic unit of crawl output. Edges are append-only
//! and are written out as a JSON array.

mod edge;

pub use edge::{ForwardEdge, PostInfo, SourceInfo, TargetInfo};
