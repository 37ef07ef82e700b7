//! Assistant panel for the grid station map.
//!
//! Resolves free-text questions about stations into replies (offline
//! directory lookup or an external generative provider), annotates replies
//! into renderable segments, and tracks the per-session message history.

pub mod annotator;
pub mod error;
pub mod resolver;
pub mod session;

pub use annotator::{annotate, reconstruct, referenced_ids, render, Inline, RenderNode, Segment};
pub use error::ChatError;
pub use resolver::{
    build_resolver, GeminiProvider, GenerativeProvider, OfflineResolver, OnlineResolver,
    QueryResolver, ResolverMode, NOT_FOUND_REPLY, PROVIDER_ERROR_REPLY,
};
pub use session::{ChatSession, GREETING};
