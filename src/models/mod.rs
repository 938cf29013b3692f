//! Request and Response models for the gateway API
//!
//! This module defines the DTOs used for deserializing query strings and
//! serializing response bodies.

pub mod envelope;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use envelope::Envelope;
pub use requests::{
    ApodRandomQuery, ApodRangeQuery, EonetEventsQuery, EpicDatesQuery, GibsCapabilitiesQuery,
    GibsImageryQuery, GibsMapQuery, GibsTileQuery, LatestPhotosQuery, MediaSearchQuery,
    NeoFeedQuery, PopularQuery, RoverPhotosQuery,
};
pub use responses::{CacheHealth, HealthResponse};
