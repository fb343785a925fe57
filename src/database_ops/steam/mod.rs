//! Steam store sources: the featured "specials" listing and per-app details.
pub mod enrich;
pub mod provider;

pub use enrich::{deck_compatible, filter_by_discount, EnrichedGame};
pub use provider::{AppDetails, SteamAdapter, SteamCandidate};
