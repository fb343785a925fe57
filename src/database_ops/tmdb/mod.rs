//! TMDB movie listings. No per-item detail fetch and no inclusion filter:
//! every listed movie flows straight to dedup and transform.
pub mod provider;

pub use provider::{MovieSource, TmdbAdapter, TmdbMovie};
