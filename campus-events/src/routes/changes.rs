// GET /changes?tables=participations,certificates
//
// Streams change-feed entries as Server-Sent Events:
//
//   event: <table>            (e.g. "certificates")
//   id:    <change id>        (e.g. "chg_0190...")
//   data:  <ChangeEvent json>
//
// Staff receive every change. Other users receive changes to their own rows
// plus the public event/activity catalogue.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use campus_shared::errors::{AppError, AppResult};
use campus_shared::types::auth::RequestContext;
use campus_shared::types::event::{ChangeEvent, Table};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    /// Comma-separated table names; omit for all tables.
    pub tables: Option<String>,
}

impl ChangesQuery {
    fn parsed_tables(&self) -> AppResult<Vec<Table>> {
        match &self.tables {
            None => Ok(Vec::new()),
            Some(raw) => raw
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.parse::<Table>().map_err(AppError::bad_request))
                .collect(),
        }
    }
}

fn visible_to(ctx: &RequestContext, change: &ChangeEvent) -> bool {
    ctx.is_staff()
        || matches!(change.table, Table::Events | Table::Activities)
        || change.user_id == Some(ctx.user_id)
}

/// Filter applied to each broadcast change before it is sent.
struct ChangeFilter {
    ctx: RequestContext,
    tables: Vec<Table>,
}

impl ChangeFilter {
    fn matches(&self, change: &ChangeEvent) -> bool {
        (self.tables.is_empty() || self.tables.contains(&change.table)) && visible_to(&self.ctx, change)
    }
}

pub async fn stream_changes(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ChangesQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    let filter = ChangeFilter {
        tables: query.parsed_tables()?,
        ctx,
    };
    let mut rx = state.feed.stream();

    tracing::info!(
        user_id = %filter.ctx.user_id,
        tables = query.tables.as_deref().unwrap_or("*"),
        "change stream opened"
    );

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    if !filter.matches(&change) {
                        continue;
                    }
                    let json = match serde_json::to_string(&change) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to serialize change");
                            continue;
                        }
                    };
                    yield Ok(SseEvent::default()
                        .event(change.table.as_str())
                        .id(change.id.clone())
                        .data(json));
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "change stream lagged");
                    yield Ok(SseEvent::default()
                        .event("_lagged")
                        .data(format!("{{\"skipped\":{n}}}")));
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
