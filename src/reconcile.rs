//! Route reconciliation engine.
//!
//! Pure request assembly and response application. The session shell wraps
//! these with status handling and persistence; only a successful
//! reconciliation may replace the route wholesale.

use crate::model::{OptimizeRequest, OptimizeResponse, OptimizedRoute, PendingBatch, RoutePoint};
use crate::points::active_points;
use crate::session::SessionError;

/// Assembles the optimization request from the pending batch plus the
/// currently active points. Rejected before any external work when both
/// are empty: there is nothing to optimize.
pub fn build_request(
    batch: &PendingBatch,
    current: Option<&OptimizedRoute>,
) -> Result<OptimizeRequest, SessionError> {
    let existing_points = current.map_or_else(Vec::new, |route| active_points(&route.points));
    if batch.is_empty() && existing_points.is_empty() {
        return Err(SessionError::NothingToOptimize);
    }
    Ok(OptimizeRequest {
        batch: batch.clone(),
        existing_points,
    })
}

/// Turns a successful optimizer response into the new route. Every returned
/// point is readmitted as active; the optimizer's output is the complete
/// route from here on.
pub fn apply_response(response: OptimizeResponse) -> OptimizedRoute {
    let points: Vec<RoutePoint> = response
        .points
        .into_iter()
        .map(|mut p| {
            p.active = true;
            p
        })
        .collect();
    OptimizedRoute {
        points,
        summary: response.summary,
        geometry: response.geometry,
    }
}
