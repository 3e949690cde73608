//! The route session: state machine and orchestration shell.
//!
//! Owns the durable snapshot, the pending batch, per-action statuses, and
//! the last error. Every mutation goes through the pure reducers in
//! [`crate::batch`], [`crate::points`], and [`crate::reconcile`] and swaps
//! the affected state wholesale; every successful mutation of the durable
//! snapshot is persisted through the store.
//!
//! External collaborators are passed per call as trait bounds, so the same
//! session drives the HTTP adapter in production and fixtures in tests.

use std::fmt;

use tracing::debug;

use crate::batch;
use crate::model::{
    ActionStatus, Contribution, ExportArtifact, ExportFormat, OptimizeRequest, OptimizeResponse,
    OptimizedRoute, PendingBatch, PointId, RoutePoint, RouteSummary, SessionState,
};
use crate::points;
use crate::polyline::Polyline;
use crate::reconcile;
use crate::store::{SessionStore, StorageBackend};
use crate::traits::{
    Geocoder, NavigationLinkBuilder, RemoteError, RouteEnricher, RouteExporter, RouteOptimizer,
};

/// Storage key for the durable session snapshot.
pub const SESSION_KEY: &str = "route-session";

/// Autocomplete queries shorter than this never reach the geocoder.
const AUTOCOMPLETE_MIN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Pending batch and active point set are both empty.
    NothingToOptimize,
    /// A structural edit or second reconcile was attempted while an
    /// optimize request is outstanding.
    OptimizeInFlight,
    /// An enrichment request is outstanding.
    EnrichInFlight,
    /// A reconcile result arrived with no optimize request outstanding,
    /// e.g. after a reset settled the session in between.
    NoReconcileInFlight,
    /// The operation needs active points and there are none.
    EmptyRoute,
    /// A remote call failed; carries the user-visible message.
    Remote(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToOptimize => f.write_str("No points to optimize."),
            Self::OptimizeInFlight => f.write_str("An optimization is already in progress."),
            Self::EnrichInFlight => f.write_str("An enrichment is already in progress."),
            Self::NoReconcileInFlight => f.write_str("No optimization is in progress."),
            Self::EmptyRoute => f.write_str("The route has no active points."),
            Self::Remote(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for SessionError {}

/// Session state machine over a storage backend.
pub struct RouteSession<B: StorageBackend> {
    store: SessionStore<B>,
    state: SessionState,
    pending: PendingBatch,
    needs_reoptimization: bool,
    error: Option<String>,
    navigation_links: Vec<String>,
    optimize_status: ActionStatus,
    enrich_status: ActionStatus,
    manual_counter: u64,
}

impl<B: StorageBackend> RouteSession<B> {
    /// Opens a session, rehydrating the durable snapshot from the backend.
    /// The manual-id counter is re-seeded past any manual ids already in
    /// the stored route so reloads never reuse an id.
    pub fn open(backend: B) -> Self {
        let store = SessionStore::new(backend);
        let state: SessionState = store.load(SESSION_KEY, SessionState::default());
        let manual_counter = state
            .optimized_route
            .as_ref()
            .map_or(0, |route| points::next_manual_counter(&route.points));
        Self {
            store,
            state,
            pending: PendingBatch::default(),
            needs_reoptimization: false,
            error: None,
            navigation_links: Vec::new(),
            optimize_status: ActionStatus::Idle,
            enrich_status: ActionStatus::Idle,
            manual_counter,
        }
    }

    // ---- read surface ----

    pub fn route(&self) -> Option<&OptimizedRoute> {
        self.state.optimized_route.as_ref()
    }

    pub fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    pub fn needs_reoptimization(&self) -> bool {
        self.needs_reoptimization
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn navigation_links(&self) -> &[String] {
        &self.navigation_links
    }

    pub fn optimize_status(&self) -> &ActionStatus {
        &self.optimize_status
    }

    pub fn enrich_status(&self) -> &ActionStatus {
        &self.enrich_status
    }

    // ---- pending batch ----

    /// Stages a new arrival of raw input for the next reconciliation.
    pub fn add_contribution(&mut self, contribution: Contribution) {
        self.pending = batch::merge(&self.pending, contribution);
        self.needs_reoptimization = true;
        debug!(
            files = self.pending.files.len(),
            links = self.pending.links.len(),
            texts = self.pending.texts.len(),
            "contribution staged"
        );
    }

    // ---- point lifecycle ----

    /// Removes a point from the current route. Rejected while an optimize
    /// request is in flight; a late response must never overwrite the edit.
    pub fn delete_point(&mut self, id: &PointId) -> Result<(), SessionError> {
        self.reject_if_optimizing()?;
        if let Some(route) = self.state.optimized_route.as_mut() {
            route.points = points::delete_point(&route.points, id);
            self.persist();
        }
        self.needs_reoptimization = true;
        Ok(())
    }

    /// Flips a point's active flag. Same in-flight rejection as delete.
    pub fn toggle_point_active(&mut self, id: &PointId) -> Result<(), SessionError> {
        self.reject_if_optimizing()?;
        if let Some(route) = self.state.optimized_route.as_mut() {
            route.points = points::toggle_active(&route.points, id);
            self.persist();
        }
        self.needs_reoptimization = true;
        Ok(())
    }

    /// Geocodes a free-text query and appends the hit as a new active point
    /// with a fresh manual id. Creates a single-point route when none
    /// exists. Geocoder failure leaves state unchanged.
    pub fn manual_add<G: Geocoder>(
        &mut self,
        geocoder: &G,
        query: &str,
    ) -> Result<(), SessionError> {
        self.reject_if_optimizing()?;
        self.error = None;

        let hit = match geocoder.search(query) {
            Ok(hit) => hit,
            Err(err) => return Err(self.record_remote(err)),
        };

        let order = self
            .state
            .optimized_route
            .as_ref()
            .map_or(0, |route| points::active_points(&route.points).len() as u32)
            + 1;
        let id = PointId::manual(self.manual_counter);
        self.manual_counter += 1;
        let point = points::manual_point(hit, order, id);

        match self.state.optimized_route.as_mut() {
            Some(route) => route.points.push(point),
            None => {
                self.state.optimized_route = Some(OptimizedRoute {
                    points: vec![point],
                    summary: RouteSummary::zero(),
                    geometry: Polyline::empty(),
                });
            }
        }
        self.needs_reoptimization = true;
        self.persist();
        Ok(())
    }

    // ---- reconciliation ----

    /// Validates and assembles the optimization request, marking the
    /// optimize action in flight. Must be paired with
    /// [`complete_reconcile`](Self::complete_reconcile); the convenience
    /// wrapper [`reconcile`](Self::reconcile) does both.
    pub fn begin_reconcile(&mut self) -> Result<OptimizeRequest, SessionError> {
        if self.optimize_status.is_in_flight() {
            return Err(SessionError::OptimizeInFlight);
        }
        let request =
            match reconcile::build_request(&self.pending, self.state.optimized_route.as_ref()) {
                Ok(request) => request,
                Err(err) => {
                    self.error = Some(err.to_string());
                    return Err(err);
                }
            };
        self.error = None;
        self.optimize_status = ActionStatus::InFlight;
        debug!(
            existing = request.existing_points.len(),
            "reconciliation begun"
        );
        Ok(request)
    }

    /// Settles an in-flight reconciliation. Success replaces the route
    /// wholesale (every returned point readmitted as active), drains the
    /// pending batch, and clears the reoptimization flag. Failure leaves
    /// route, batch, and flag exactly as they were.
    ///
    /// A result with no optimize outstanding is dropped without touching
    /// state: a reset settles the status back to idle, so a response from
    /// before the reset can never overwrite the wiped session.
    pub fn complete_reconcile(
        &mut self,
        result: Result<OptimizeResponse, RemoteError>,
    ) -> Result<(), SessionError> {
        if !self.optimize_status.is_in_flight() {
            debug!("dropping reconcile result with no request outstanding");
            return Err(SessionError::NoReconcileInFlight);
        }
        match result {
            Ok(response) => {
                let route = reconcile::apply_response(response);
                debug!(points = route.points.len(), "reconciliation applied");
                self.state.optimized_route = Some(route);
                self.pending = PendingBatch::default();
                self.needs_reoptimization = false;
                self.optimize_status = ActionStatus::Succeeded;
                self.persist();
                Ok(())
            }
            Err(err) => {
                self.optimize_status = ActionStatus::Failed(err.message().to_string());
                Err(self.record_remote(err))
            }
        }
    }

    /// One full reconciliation pass against an optimizer.
    pub fn reconcile<O: RouteOptimizer>(&mut self, optimizer: &O) -> Result<(), SessionError> {
        let request = self.begin_reconcile()?;
        let result = optimizer.optimize(&request);
        self.complete_reconcile(result)
    }

    // ---- delegators ----

    /// Sends the entire point sequence (active and inactive) for attribute
    /// enrichment. The response must preserve count, identity, and order;
    /// anything else is rejected and the route stays unchanged.
    pub fn enrich<E: RouteEnricher>(&mut self, enricher: &E) -> Result<(), SessionError> {
        if self.enrich_status.is_in_flight() {
            return Err(SessionError::EnrichInFlight);
        }
        let Some(current_points) = self
            .state
            .optimized_route
            .as_ref()
            .map(|route| route.points.clone())
        else {
            return Ok(());
        };
        self.error = None;
        self.enrich_status = ActionStatus::InFlight;

        match enricher.enrich(&current_points) {
            Ok(enriched) if identity_preserved(&current_points, &enriched) => {
                if let Some(route) = self.state.optimized_route.as_mut() {
                    route.points = enriched;
                }
                self.enrich_status = ActionStatus::Succeeded;
                self.persist();
                Ok(())
            }
            Ok(_) => {
                tracing::warn!("enrichment response did not match the current route");
                let err = RemoteError::new("Enrichment response did not match the current route.");
                self.enrich_status = ActionStatus::Failed(err.message().to_string());
                Err(self.record_remote(err))
            }
            Err(err) => {
                self.enrich_status = ActionStatus::Failed(err.message().to_string());
                Err(self.record_remote(err))
            }
        }
    }

    /// Exports the active points to a downloadable artifact. No composition
    /// state changes; only the last-error field is touched on failure.
    ///
    /// A route with no active points is rejected locally with
    /// [`SessionError::EmptyRoute`] instead of letting the export service
    /// return its rejection for an empty point list.
    pub fn export<X: RouteExporter>(
        &mut self,
        exporter: &X,
        format: ExportFormat,
    ) -> Result<ExportArtifact, SessionError> {
        self.error = None;
        let active = self.active_route_points().ok_or(SessionError::EmptyRoute)?;
        exporter
            .export(format, &active)
            .map_err(|err| self.record_remote(err))
    }

    /// Generates navigation links for the active points and stores them on
    /// the session. Failure clears the stored list; it is never left stale.
    pub fn generate_navigation_links<L: NavigationLinkBuilder>(
        &mut self,
        builder: &L,
    ) -> Result<(), SessionError> {
        self.error = None;
        let Some(active) = self.active_route_points() else {
            self.navigation_links.clear();
            self.error = Some(SessionError::EmptyRoute.to_string());
            return Err(SessionError::EmptyRoute);
        };
        match builder.build_links(&active) {
            Ok(links) => {
                self.navigation_links = links;
                Ok(())
            }
            Err(err) => {
                self.navigation_links.clear();
                Err(self.record_remote(err))
            }
        }
    }

    /// Live address suggestions. Short inputs short-circuit to an empty
    /// list; geocoder failures degrade to an empty list inside the trait.
    pub fn autocomplete<G: Geocoder>(&self, geocoder: &G, partial: &str) -> Vec<String> {
        if partial.chars().count() < AUTOCOMPLETE_MIN_CHARS {
            return Vec::new();
        }
        geocoder.autocomplete(partial)
    }

    // ---- reset ----

    /// Total state wipe: route, batch, links, error, flag, statuses.
    pub fn reset(&mut self) {
        self.state.optimized_route = None;
        self.pending = PendingBatch::default();
        self.navigation_links.clear();
        self.error = None;
        self.needs_reoptimization = false;
        self.optimize_status = ActionStatus::Idle;
        self.enrich_status = ActionStatus::Idle;
        self.manual_counter = 0;
        self.persist();
        debug!("session reset");
    }

    // ---- internals ----

    fn reject_if_optimizing(&self) -> Result<(), SessionError> {
        if self.optimize_status.is_in_flight() {
            Err(SessionError::OptimizeInFlight)
        } else {
            Ok(())
        }
    }

    fn active_route_points(&self) -> Option<Vec<RoutePoint>> {
        let route = self.state.optimized_route.as_ref()?;
        let active = points::active_points(&route.points);
        if active.is_empty() { None } else { Some(active) }
    }

    fn record_remote(&mut self, err: RemoteError) -> SessionError {
        let message = err.message().to_string();
        self.error = Some(message.clone());
        SessionError::Remote(message)
    }

    fn persist(&mut self) {
        self.store.save(SESSION_KEY, &self.state);
    }
}

/// True when `after` has the same ids in the same order as `before`.
fn identity_preserved(before: &[RoutePoint], after: &[RoutePoint]) -> bool {
    before.len() == after.len()
        && before
            .iter()
            .zip(after)
            .all(|(b, a)| b.original_index == a.original_index)
}
