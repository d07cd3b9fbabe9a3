use std::sync::Arc;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::BookingRateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pawhub_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing booking events.
    pub event_bus: Arc<pawhub_events::EventBus>,
    /// Booking-creation rate limiter (persistent ledger + memory fallback).
    pub rate_limiter: Arc<BookingRateLimiter>,
}
