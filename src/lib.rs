//! route-session core
//!
//! Client-side session state machine for a route-planning application:
//! accumulates raw user contributions, reconciles them with the previously
//! optimized route through an external optimization service, and keeps the
//! result durable across restarts.

pub mod api;
pub mod batch;
pub mod model;
pub mod points;
pub mod polyline;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod traits;
