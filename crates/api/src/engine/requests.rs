//! Proximity request lifecycle.
//!
//! Every transition locks the request row with `SELECT ... FOR UPDATE`
//! before deciding, so of two concurrent approve / reject / expire calls
//! the second sees the first one's terminal status and fails with
//! `AlreadyResolved`. The periodic sweep uses a conditional
//! `UPDATE ... WHERE status = 'pending'`, which re-checks the status after
//! waiting on the same row lock.

use std::sync::Arc;

use blip_core::activity::{check_joinable, JoinCheck};
use blip_core::error::CoreError;
use blip_core::geo::{distance_meters, GeoPoint};
use blip_core::notification::NotificationKind;
use blip_core::proximity::{
    self, authorize_action, authorize_view, plan_transition, DailyCap, RequestAction,
    RequestKind, RequestStatus, TransitionPlan, DAILY_CAP_WINDOW_HOURS, POLL_INTERVAL_SECS,
};
use blip_core::types::{DbId, Timestamp};
use blip_db::models::proximity_request::{
    CreateProximityRequest, NewProximityRequest, ProximityRequest,
};
use blip_db::models::route::{Route, RouteGeometry};
use blip_db::repositories::{ActivityRepo, ProximityRequestRepo, RouteRepo, UserRepo};
use blip_events::{NotificationSink, PlatformEvent};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::engine::presence;
use crate::error::{is_unique_violation, AppError, AppResult};

const SOURCE_ENTITY: &str = "proximity_request";

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A route plus whether it still tracks positions.
#[derive(Debug, Serialize)]
pub struct RouteView {
    #[serde(flatten)]
    pub route: Route,
    pub is_live: bool,
}

/// What status polls and the list endpoints return.
#[derive(Debug, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: ProximityRequest,
    pub kind: RequestKind,
    pub seconds_remaining: i64,
    pub poll_interval_secs: u64,
    pub route: Option<RouteView>,
}

impl RequestView {
    pub fn build(request: ProximityRequest, route: Option<Route>, now: Timestamp) -> Self {
        let seconds_remaining = if request.status == proximity::STATUS_PENDING {
            proximity::seconds_remaining(request.deadline_at, now)
        } else {
            0
        };
        let route = route.map(|route| RouteView {
            is_live: proximity::route_is_live(route.created_at, now),
            route,
        });
        RequestView {
            kind: request.kind(),
            request,
            seconds_remaining,
            poll_interval_secs: POLL_INTERVAL_SECS,
            route,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs the request state machine against the database.
#[derive(Clone)]
pub struct RequestEngine {
    pool: PgPool,
    sink: Arc<dyn NotificationSink>,
    daily_cap: DailyCap,
}

impl RequestEngine {
    pub fn new(pool: PgPool, sink: Arc<dyn NotificationSink>, daily_cap: DailyCap) -> Self {
        Self {
            pool,
            sink,
            daily_cap,
        }
    }

    /// Open a request from `requester_id`.
    pub async fn create(
        &self,
        requester_id: DbId,
        input: &CreateProximityRequest,
    ) -> AppResult<ProximityRequest> {
        proximity::validate_new_request(requester_id, input.target_id)?;
        let location = GeoPoint::new(input.latitude, input.longitude)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Serializes this requester's creates so the open-request check and
        // the daily cap count see each other.
        UserRepo::lock_by_id(&mut *tx, requester_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: requester_id,
            })?;
        UserRepo::find_by_id(&mut *tx, input.target_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: input.target_id,
            })?;

        let mut lazily_expired = None;
        if let Some(open) = ProximityRequestRepo::lock_open(
            &mut *tx,
            requester_id,
            input.target_id,
            input.activity_id,
        )
        .await?
        {
            if !proximity::is_overdue(open.deadline_at, now) {
                return Err(CoreError::DuplicateOpenRequest.into());
            }
            lazily_expired =
                ProximityRequestRepo::resolve(&mut *tx, open.id, RequestStatus::Expired, false)
                    .await?;
        }

        let since = now - Duration::hours(DAILY_CAP_WINDOW_HOURS);
        let sent =
            ProximityRequestRepo::count_sent_since(&mut *tx, requester_id, input.target_id, since)
                .await?;
        self.daily_cap.check(sent)?;

        if let Some(activity_id) = input.activity_id {
            let activity = ActivityRepo::lock_by_id(&mut *tx, activity_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Activity",
                    id: activity_id,
                })?;
            if activity.owner_id != input.target_id {
                return Err(CoreError::TargetUnavailable(
                    "Activity is not hosted by the target user".into(),
                )
                .into());
            }
            let check = JoinCheck {
                is_active: activity.active_at(now),
                participant_count: ActivityRepo::count_participants(&mut *tx, activity_id).await?,
                max_participants: activity.max_participants,
                already_participant: ActivityRepo::is_participant(
                    &mut *tx,
                    activity_id,
                    requester_id,
                )
                .await?,
            };
            check_joinable(&check)?;
        }

        let new_request = NewProximityRequest {
            requester_id,
            target_id: input.target_id,
            activity_id: input.activity_id,
            requester_location: location,
            created_at: now,
            deadline_at: proximity::deadline_for(now),
        };
        let request = match ProximityRequestRepo::create(&mut *tx, &new_request).await {
            Ok(request) => request,
            Err(e) if is_unique_violation(&e, "uq_proximity_requests_open") => {
                return Err(CoreError::DuplicateOpenRequest.into());
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        if let Some(expired) = &lazily_expired {
            self.emit_resolution(expired, None);
        }

        tracing::info!(
            request_id = request.id,
            requester_id,
            target_id = request.target_id,
            activity_id = ?request.activity_id,
            deadline_at = %request.deadline_at,
            "Proximity request created",
        );

        self.sink.emit(
            PlatformEvent::new(NotificationKind::RequestCreated, request.target_id)
                .with_source(SOURCE_ENTITY, request.id)
                .with_actor(requester_id)
                .with_payload(json!({
                    "request_id": request.id,
                    "kind": request.kind(),
                    "activity_id": request.activity_id,
                    "deadline_at": request.deadline_at,
                })),
        );

        Ok(request)
    }

    /// Approve as the target. `target_location` overrides the target's
    /// stored position and is saved as a heartbeat once the approve commits.
    pub async fn approve(
        &self,
        actor: DbId,
        request_id: DbId,
        target_location: Option<GeoPoint>,
    ) -> AppResult<RequestView> {
        if let Some(point) = &target_location {
            point.validate()?;
        }
        let view = self
            .transition(actor, request_id, RequestAction::Approve, target_location)
            .await?;

        // The approve has committed; a failed heartbeat must not undo it.
        if let Some(point) = target_location {
            if let Err(e) = presence::record_heartbeat(&self.pool, actor, point).await {
                tracing::warn!(request_id, actor, error = %e, "Approve location not saved");
            }
        }
        Ok(view)
    }

    /// Reject as the target.
    pub async fn reject(&self, actor: DbId, request_id: DbId) -> AppResult<RequestView> {
        self.transition(actor, request_id, RequestAction::Reject, None)
            .await
    }

    /// Cancel as the requester. Recorded as `expired` with `withdrawn = true`.
    pub async fn withdraw(&self, actor: DbId, request_id: DbId) -> AppResult<RequestView> {
        self.transition(actor, request_id, RequestAction::Withdraw, None)
            .await
    }

    /// Read the current state, expiring the request first if its deadline
    /// has passed.
    pub async fn check_status(&self, actor: DbId, request_id: DbId) -> AppResult<RequestView> {
        let now = Utc::now();
        let mut request = ProximityRequestRepo::find_by_id(&self.pool, request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ProximityRequest",
                id: request_id,
            })?;
        authorize_view(actor, request.requester_id, request.target_id)?;

        if request.status()? == RequestStatus::Pending
            && proximity::is_overdue(request.deadline_at, now)
        {
            request = self.expire_one(request_id, now).await?;
        }

        let route = self.route_for(&request).await?;
        Ok(RequestView::build(request, route, now))
    }

    /// Requests addressed to `user_id`, newest first.
    pub async fn list_incoming(
        &self,
        user_id: DbId,
        status: Option<RequestStatus>,
        limit: i64,
    ) -> AppResult<Vec<RequestView>> {
        let requests =
            ProximityRequestRepo::list_incoming(&self.pool, user_id, status, limit).await?;
        self.views(requests).await
    }

    /// Requests sent by `user_id`, newest first.
    pub async fn list_outgoing(
        &self,
        user_id: DbId,
        status: Option<RequestStatus>,
        limit: i64,
    ) -> AppResult<Vec<RequestView>> {
        let requests =
            ProximityRequestRepo::list_outgoing(&self.pool, user_id, status, limit).await?;
        self.views(requests).await
    }

    /// Expire every overdue pending request. Returns how many this call
    /// expired.
    pub async fn expire_overdue(&self) -> AppResult<usize> {
        let expired = ProximityRequestRepo::expire_overdue(&self.pool, Utc::now()).await?;
        for request in &expired {
            tracing::debug!(request_id = request.id, "Proximity request expired by sweep");
            self.emit_resolution(request, None);
        }
        Ok(expired.len())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn transition(
        &self,
        actor: DbId,
        request_id: DbId,
        action: RequestAction,
        target_location: Option<GeoPoint>,
    ) -> AppResult<RequestView> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = ProximityRequestRepo::lock_by_id(&mut *tx, request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ProximityRequest",
                id: request_id,
            })?;
        authorize_action(action, actor, request.requester_id, request.target_id)?;

        let plan = plan_transition(
            request.id,
            request.status()?,
            request.deadline_at,
            now,
            action,
        )?;
        let status = match plan {
            TransitionPlan::Apply(status) => status,
            TransitionPlan::ExpireInstead => {
                let expired =
                    write_status(&mut *tx, &request, RequestStatus::Expired, false).await?;
                tx.commit().await?;
                tracing::info!(
                    request_id,
                    action = action.as_str(),
                    "Proximity request expired before action",
                );
                self.emit_resolution(&expired, None);
                return Err(CoreError::AlreadyResolved {
                    request_id,
                    status: RequestStatus::Expired.as_str().to_string(),
                }
                .into());
            }
            TransitionPlan::Unchanged => {
                return Err(AppError::InternalError(format!(
                    "No transition planned for {} on request {request_id}",
                    action.as_str()
                )));
            }
        };

        let route = if status == RequestStatus::Approved {
            Some(materialize_route(&mut *tx, &request, target_location, now).await?)
        } else {
            None
        };

        let withdrawn = action == RequestAction::Withdraw;
        let resolved = write_status(&mut *tx, &request, status, withdrawn).await?;
        tx.commit().await?;

        tracing::info!(
            request_id,
            actor,
            action = action.as_str(),
            status = status.as_str(),
            "Proximity request resolved",
        );
        self.emit_resolution(&resolved, route.as_ref());

        Ok(RequestView::build(resolved, route, now))
    }

    /// Expire one overdue request under its row lock. If another writer
    /// resolved it first, returns the row as that writer left it.
    async fn expire_one(&self, request_id: DbId, now: Timestamp) -> AppResult<ProximityRequest> {
        let mut tx = self.pool.begin().await?;
        let request = ProximityRequestRepo::lock_by_id(&mut *tx, request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ProximityRequest",
                id: request_id,
            })?;

        match plan_transition(
            request.id,
            request.status()?,
            request.deadline_at,
            now,
            RequestAction::Expire,
        ) {
            Ok(TransitionPlan::Apply(status)) => {
                let expired = write_status(&mut *tx, &request, status, false).await?;
                tx.commit().await?;
                tracing::info!(request_id, "Proximity request expired on poll");
                self.emit_resolution(&expired, None);
                Ok(expired)
            }
            Ok(_) | Err(CoreError::AlreadyResolved { .. }) => Ok(request),
            Err(e) => Err(e.into()),
        }
    }

    async fn route_for(&self, request: &ProximityRequest) -> AppResult<Option<Route>> {
        if request.status()? != RequestStatus::Approved {
            return Ok(None);
        }
        Ok(RouteRepo::find_by_request(&self.pool, request.id).await?)
    }

    async fn views(&self, requests: Vec<ProximityRequest>) -> AppResult<Vec<RequestView>> {
        let now = Utc::now();
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let route = self.route_for(&request).await?;
            views.push(RequestView::build(request, route, now));
        }
        Ok(views)
    }

    /// Tell the affected party (or both, for a deadline expiry) about a
    /// terminal transition.
    fn emit_resolution(&self, request: &ProximityRequest, route: Option<&Route>) {
        let payload = json!({
            "request_id": request.id,
            "status": request.status,
            "withdrawn": request.withdrawn,
            "activity_id": request.activity_id,
            "distance_meters": route.map(|r| r.distance_meters),
        });
        let event = |kind, recipient| {
            PlatformEvent::new(kind, recipient)
                .with_source(SOURCE_ENTITY, request.id)
                .with_payload(payload.clone())
        };

        match request.status() {
            Ok(RequestStatus::Approved) => self.sink.emit(
                event(NotificationKind::RequestApproved, request.requester_id)
                    .with_actor(request.target_id),
            ),
            Ok(RequestStatus::Rejected) => self.sink.emit(
                event(NotificationKind::RequestRejected, request.requester_id)
                    .with_actor(request.target_id),
            ),
            Ok(RequestStatus::Expired) if request.withdrawn => self.sink.emit(
                event(NotificationKind::RequestExpired, request.target_id)
                    .with_actor(request.requester_id),
            ),
            Ok(RequestStatus::Expired) => {
                self.sink
                    .emit(event(NotificationKind::RequestExpired, request.requester_id));
                self.sink
                    .emit(event(NotificationKind::RequestExpired, request.target_id));
            }
            Ok(RequestStatus::Pending) => {}
            Err(e) => {
                tracing::error!(error = %e, request_id = request.id, "Unreadable request status");
            }
        }
    }
}

/// Write a terminal status on a row the caller holds locked.
async fn write_status(
    conn: &mut PgConnection,
    request: &ProximityRequest,
    status: RequestStatus,
    withdrawn: bool,
) -> AppResult<ProximityRequest> {
    ProximityRequestRepo::resolve(conn, request.id, status, withdrawn)
        .await?
        .ok_or_else(|| {
            AppError::from(CoreError::AlreadyResolved {
                request_id: request.id,
                status: request.status.clone(),
            })
        })
}

/// Build the route for an approval and, for activity requests, grow the
/// participant set. Nothing is written if the activity filled up first.
async fn materialize_route(
    conn: &mut PgConnection,
    request: &ProximityRequest,
    target_location: Option<GeoPoint>,
    now: Timestamp,
) -> AppResult<Route> {
    let target_point = match target_location {
        Some(point) => point,
        None => UserRepo::find_by_id(&mut *conn, request.target_id)
            .await?
            .and_then(|target| target.location())
            .ok_or_else(|| {
                CoreError::Validation(
                    "Target location unknown; include coordinates when approving".into(),
                )
            })?,
    };

    if let Some(activity_id) = request.activity_id {
        let activity = ActivityRepo::lock_by_id(&mut *conn, activity_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Activity",
                id: activity_id,
            })?;
        if !activity.active_at(now) {
            return Err(
                CoreError::TargetUnavailable("Activity is no longer active".into()).into(),
            );
        }
        let count = ActivityRepo::count_participants(&mut *conn, activity_id).await?;
        if count >= i64::from(activity.max_participants) {
            return Err(CoreError::ActivityFull { activity_id }.into());
        }
        match ActivityRepo::add_participant(&mut *conn, activity_id, request.requester_id).await {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e, "uq_activity_participants_member") => {
                return Err(CoreError::TargetUnavailable(
                    "Already a participant of this activity".into(),
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let requester_point = request.requester_location();
    let geometry = RouteGeometry {
        requester: requester_point,
        target: target_point,
        distance_meters: distance_meters(&requester_point, &target_point)?,
    };
    Ok(RouteRepo::create(
        &mut *conn,
        request.id,
        request.requester_id,
        request.target_id,
        &geometry,
    )
    .await?)
}
