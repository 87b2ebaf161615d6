//! Handlers for `/status` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/status/:ticket_id` | Full [`StatusRecord`] |
//! | `GET`  | `/status/:ticket_id/history` | `startDate`/`endDate` (inclusive), `limit` (most recent N) |
//! | `POST` | `/status/:ticket_id/update` | Body: [`UpdateBody`]; first update creates the record |
//! | `POST` | `/status/batch` | Body: [`BatchBody`]; map of known tickets to summaries |
//! | `POST` | `/status/updates` | `?since=<rfc3339>`; batch narrowed to tickets updated after `since` |

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::HeaderMap,
};
use chrono::{DateTime, Utc};
use minder_core::{
  engine::UpdateEngine,
  notify::Notifier,
  record::{HistoryEntry, StatusRecord, UpdateKind, UpdateRequest},
  status::TicketStatus,
  store::{HistoryQuery, LatestUpdate, StatusStore, StatusSummary},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Internal services relaying feed traffic mark their calls with this header
/// instead of the `fromMessageQueue` body flag.
pub const INTERNAL_ORIGIN_HEADER: &str = "x-internal-origin";

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /status/:ticket_id`
pub async fn get_one<S, N>(
  State(engine): State<Arc<UpdateEngine<S, N>>>,
  Path(ticket_id): Path<String>,
) -> Result<Json<StatusRecord>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let record = engine.record(&ticket_id).await?.ok_or_else(|| {
    ApiError::NotFound(format!("ticket {ticket_id} not found"))
  })?;
  Ok(Json(record))
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
  /// Inclusive lower bound on entry timestamps.
  pub start_date: Option<DateTime<Utc>>,
  /// Inclusive upper bound on entry timestamps.
  pub end_date:   Option<DateTime<Utc>>,
  /// Keep only the most recent N entries after date filtering.
  pub limit:      Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
  pub ticket_id: String,
  pub entries:   Vec<HistoryEntry>,
}

/// `GET /status/:ticket_id/history[?startDate=...][&endDate=...][&limit=N]`
pub async fn history<S, N>(
  State(engine): State<Arc<UpdateEngine<S, N>>>,
  Path(ticket_id): Path<String>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let query = HistoryQuery {
    start_date: params.start_date,
    end_date:   params.end_date,
    limit:      params.limit,
  };
  let entries = engine.history(&ticket_id, &query).await?.ok_or_else(|| {
    ApiError::NotFound(format!("ticket {ticket_id} not found"))
  })?;
  Ok(Json(HistoryResponse { ticket_id, entries }))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /status/:ticket_id/update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  /// Target status; parsed case-insensitively, `-` treated as `_`.
  pub status:             String,
  pub updated_by:         String,
  pub reason:             Option<String>,
  /// The caller is relaying a change that already travelled the feed; the
  /// update is applied but not re-published.
  #[serde(default)]
  pub from_message_queue: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
  pub record:   StatusRecord,
  /// What the engine did: `created`, `transitioned`, `reconfirmed`,
  /// `duplicate`, or `deleted`.
  pub result:   UpdateKind,
  pub notified: bool,
}

/// `POST /status/:ticket_id/update`
pub async fn update<S, N>(
  State(engine): State<Arc<UpdateEngine<S, N>>>,
  Path(ticket_id): Path<String>,
  headers: HeaderMap,
  Json(body): Json<UpdateBody>,
) -> Result<Json<UpdateResponse>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  if body.updated_by.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "updatedBy must not be empty".to_owned(),
    ));
  }
  let status = TicketStatus::parse(&body.status)?;

  let mut req = UpdateRequest::api(ticket_id, status, body.updated_by);
  req.reason = body.reason;
  req.already_relayed =
    body.from_message_queue || headers.contains_key(INTERNAL_ORIGIN_HEADER);

  let outcome = engine.apply(req).await?;
  Ok(Json(UpdateResponse {
    record:   outcome.record,
    result:   outcome.kind,
    notified: outcome.notified,
  }))
}

// ─── Batch ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /status/batch` and `POST /status/updates`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBody {
  pub ticket_ids: Vec<String>,
}

/// `POST /status/batch` — unknown ids are omitted from the map.
pub async fn batch<S, N>(
  State(engine): State<Arc<UpdateEngine<S, N>>>,
  Json(body): Json<BatchBody>,
) -> Result<Json<BTreeMap<String, StatusSummary>>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  Ok(Json(engine.snapshot(&body.ticket_ids).await?))
}

// ─── Updates since ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SinceParams {
  /// Only tickets updated strictly after this instant. Absent means epoch,
  /// i.e. every listed ticket that exists.
  pub since: Option<DateTime<Utc>>,
}

/// `POST /status/updates?since=<rfc3339>`
pub async fn updates<S, N>(
  State(engine): State<Arc<UpdateEngine<S, N>>>,
  Query(params): Query<SinceParams>,
  Json(body): Json<BatchBody>,
) -> Result<Json<BTreeMap<String, LatestUpdate>>, ApiError>
where
  S: StatusStore,
  N: Notifier,
{
  let since = params.since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
  Ok(Json(engine.latest(&body.ticket_ids, since).await?))
}
