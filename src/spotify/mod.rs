//! # Spotify Integration Module
//!
//! Every remote operation of the aggregator lives here. All of them go
//! through the [`client::RateLimitedClient`] owned by the
//! [`Session`](crate::session::Session), so rate limiting and status
//! handling happen in exactly one place.
//!
//! ```text
//! cli (run modes)
//!      ↓
//! auth ── tracks ── analysis ── player
//!      ↓
//! client::RateLimitedClient (429 retry, status classification)
//!      ↓
//! Spotify Web API / Accounts service
//! ```
//!
//! ## Modules
//!
//! - [`client`] - request wrapper with `Retry-After` handling
//! - [`auth`] - authorization-code flow with a local callback listener
//! - [`tracks`] - reference resolution and track metadata
//! - [`analysis`] - sequential audio analysis aggregation
//! - [`player`] - device selection and remote playback
//!
//! ## Endpoints
//!
//! - `GET /authorize`, `POST /api/token` on the accounts service
//! - `GET /search`
//! - `GET /tracks`
//! - `GET /audio-analysis/{id}`
//! - `GET /me/player/devices`
//! - `PUT /me/player/play`

pub mod analysis;
pub mod auth;
pub mod client;
pub mod player;
pub mod tracks;
