//! API Module
//!
//! HTTP surface of the gateway. Every JSON endpoint answers with an
//! [`Envelope`](crate::models::Envelope); imagery endpoints answer with the
//! upstream bytes.
//!
//! # Endpoint groups
//! - `/apod` - Astronomy Picture of the Day
//! - `/mars-rover` - latest photos, rover photos, cameras, manifests
//! - `/epic` - EPIC earth imagery metadata
//! - `/asteroids` - near-earth object feed
//! - `/media` - Image and Video Library
//! - `/eonet` - natural events
//! - `/gibs` - earth imagery tiles and maps
//! - `/health`

pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
