use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::auth::AuthUser;
use crate::models::enums::{EventStatus, EventType, ItemCondition};
use crate::models::event::{Event, EventJoinRow};
use crate::models::event_item::{
    EventItem, EventItemAssignerRow, EventItemDetail, EventItemJoinRow, EventItemWithInventory,
};
use crate::models::inventory::InventoryItem;
use crate::utils::datetime::parse_iso_datetime;
use crate::utils::error::{AppError, Validator};
use crate::utils::pagination::Pagination;
use crate::utils::response;
use crate::AppState;

pub(crate) const JOIN_SELECT: &str = "SELECT e.*, \
    l.name AS location_name, l.building AS location_building, l.floor AS location_floor, \
    u.username AS creator_username, u.full_name AS creator_full_name \
    FROM events e \
    LEFT JOIN locations l ON l.id = e.location_id \
    LEFT JOIN users u ON u.id = e.created_by";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub status: Option<String>,
    pub location_id: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct EventFilters {
    pub(crate) search: Option<String>,
    pub(crate) r#type: Option<EventType>,
    pub(crate) status: Option<EventStatus>,
    pub(crate) location_id: Option<i32>,
}

fn parse_filters(q: &ListEventsQuery, v: &mut Validator) -> EventFilters {
    let mut filters = EventFilters {
        search: q.search.clone(),
        ..Default::default()
    };

    if let Some(raw) = q.r#type.as_deref() {
        match raw.parse() {
            Ok(t) => filters.r#type = Some(t),
            Err(()) => v.push("type", "Invalid type"),
        }
    }
    if let Some(raw) = q.status.as_deref() {
        match raw.parse() {
            Ok(s) => filters.status = Some(s),
            Err(()) => v.push("status", "Invalid status"),
        }
    }
    if let Some(raw) = q.location_id.as_deref() {
        match raw.parse::<i32>() {
            Ok(id) => filters.location_id = Some(id),
            Err(_) => v.push("locationId", "Location ID must be an integer"),
        }
    }

    filters
}

pub(crate) fn push_filters(qb: &mut QueryBuilder<Postgres>, filters: &EventFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (e.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.responsible ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(t) = filters.r#type {
        qb.push(" AND e.type = ").push_bind(t);
    }
    if let Some(status) = filters.status {
        qb.push(" AND e.status = ").push_bind(status);
    }
    if let Some(location_id) = filters.location_id {
        qb.push(" AND e.location_id = ").push_bind(location_id);
    }
}

/// `endDate` may equal `startDate`; only a strictly earlier end is refused.
pub(crate) fn check_date_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), AppError> {
    if end < start {
        Err(AppError::business("End date must be after start date"))
    } else {
        Ok(())
    }
}

pub(crate) async fn fetch_items_by_event(
    pool: &PgPool,
    event_ids: &[i32],
) -> Result<HashMap<i32, Vec<EventItemWithInventory>>, AppError> {
    let rows: Vec<EventItemJoinRow> = sqlx::query_as(
        "SELECT ei.*, inv.name AS inventory_name, inv.category AS inventory_category \
         FROM event_items ei LEFT JOIN inventory inv ON inv.id = ei.inventory_id \
         WHERE ei.event_id = ANY($1) ORDER BY ei.assigned_date",
    )
    .bind(event_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i32, Vec<EventItemWithInventory>> = HashMap::new();
    for row in rows {
        let summary = row.into_summary();
        grouped
            .entry(summary.item.event_id)
            .or_default()
            .push(summary);
    }
    Ok(grouped)
}

/// GET /api/kegiatan
pub async fn list_events(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ListEventsQuery>,
) -> Result<Response, AppError> {
    let mut v = Validator::default();
    let pagination = Pagination::from_query(q.page.as_deref(), q.limit.as_deref(), &mut v);
    let filters = parse_filters(&q, &mut v);
    v.finish()?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM events e WHERE 1=1");
    push_filters(&mut count_qb, &filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE 1=1");
    push_filters(&mut qb, &filters);
    qb.push(" ORDER BY e.start_date DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());

    let rows: Vec<EventJoinRow> = qb.build_query_as().fetch_all(&state.pool).await?;

    let ids: Vec<i32> = rows.iter().map(|r| r.event.id).collect();
    let mut items = fetch_items_by_event(&state.pool, &ids).await?;

    let events: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let event_items = items.remove(&row.event.id).unwrap_or_default();
            row.into_detail(event_items)
        })
        .collect();

    Ok(response::success_data(json!({
        "events": events,
        "pagination": pagination.meta(total),
    })))
}

async fn fetch_item_details(
    pool: &PgPool,
    event_id: i32,
) -> Result<Vec<EventItemDetail>, AppError> {
    let rows: Vec<EventItemAssignerRow> = sqlx::query_as(
        "SELECT ei.*, u.username AS assigner_username, u.full_name AS assigner_full_name \
         FROM event_items ei LEFT JOIN users u ON u.id = ei.assigned_by \
         WHERE ei.event_id = $1 ORDER BY ei.assigned_date",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;

    let inventory_ids: Vec<i32> = rows.iter().map(|r| r.item.inventory_id).collect();
    let inventory: Vec<InventoryItem> =
        sqlx::query_as("SELECT * FROM inventory WHERE id = ANY($1)")
            .bind(&inventory_ids)
            .fetch_all(pool)
            .await?;
    let mut by_id: HashMap<i32, InventoryItem> =
        inventory.into_iter().map(|i| (i.id, i)).collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let inventory = by_id.remove(&row.item.inventory_id);
            row.into_detail(inventory)
        })
        .collect())
}

/// GET /api/kegiatan/:id
pub async fn get_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE e.id = ").push_bind(id);
    let row: Option<EventJoinRow> = qb.build_query_as().fetch_optional(&state.pool).await?;
    let row = row.ok_or_else(|| AppError::not_found("Event not found"))?;

    let event_items = fetch_item_details(&state.pool, id).await?;
    let event = row.into_detail(event_items);

    Ok(response::success_data(json!({ "event": event })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub participants: Option<i32>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
}

/// POST /api/kegiatan
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(body): axum::Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();

    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            v.push("name", "Name is required");
            String::new()
        }
    };
    let r#type: Option<EventType> = match body.r#type.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(t) => Some(t),
            Err(()) => {
                v.push("type", "Invalid type");
                None
            }
        },
        None => {
            v.push("type", "Invalid type");
            None
        }
    };
    let start_date = match body.start_date.as_deref().and_then(parse_iso_datetime) {
        Some(dt) => Some(dt),
        None => {
            v.push("startDate", "Valid start date is required");
            None
        }
    };
    let end_date = match body.end_date.as_deref().and_then(parse_iso_datetime) {
        Some(dt) => Some(dt),
        None => {
            v.push("endDate", "Valid end date is required");
            None
        }
    };
    let responsible = match body.responsible.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => {
            v.push("responsible", "Responsible person is required");
            String::new()
        }
    };
    let status: Option<EventStatus> = match body.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(s) => Some(s),
            Err(()) => {
                v.push("status", "Invalid status");
                None
            }
        },
        None => None,
    };
    v.finish()?;

    let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
        return Err(AppError::Internal("dates missing after validation".into()));
    };
    check_date_range(start_date, end_date)?;

    let created: Event = sqlx::query_as(
        "INSERT INTO events (name, type, description, start_date, end_date, status, \
         participants, responsible, notes, location_id, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(name)
    .bind(r#type)
    .bind(body.description)
    .bind(start_date)
    .bind(end_date)
    .bind(status.unwrap_or(EventStatus::Scheduled))
    .bind(body.participants.unwrap_or(0))
    .bind(responsible)
    .bind(body.notes)
    .bind(body.location_id)
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE e.id = ").push_bind(created.id);
    let row: EventJoinRow = qb.build_query_as().fetch_one(&state.pool).await?;
    let event = row.into_detail(Vec::<EventItemWithInventory>::new());

    Ok(response::created(
        json!({ "event": event }),
        "Event created successfully",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub participants: Option<i32>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
}

/// PUT /api/kegiatan/:id
///
/// The date-range check only fires when both dates are supplied in the same
/// payload; an update changing a single date is not compared against the
/// stored other date.
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    axum::Json(body): axum::Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();

    if let Some(name) = body.name.as_deref() {
        if name.trim().is_empty() {
            v.push("name", "Name cannot be empty");
        }
    }
    let r#type: Option<EventType> = match body.r#type.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(t) => Some(t),
            Err(()) => {
                v.push("type", "Invalid type");
                None
            }
        },
        None => None,
    };
    let status: Option<EventStatus> = match body.status.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(s) => Some(s),
            Err(()) => {
                v.push("status", "Invalid status");
                None
            }
        },
        None => None,
    };
    let start_date = match body.start_date.as_deref() {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push("startDate", "Valid start date is required");
                None
            }
        },
        None => None,
    };
    let end_date = match body.end_date.as_deref() {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push("endDate", "Valid end date is required");
                None
            }
        },
        None => None,
    };
    v.finish()?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Event not found"));
    }

    if let (Some(start), Some(end)) = (start_date, end_date) {
        check_date_range(start, end)?;
    }

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE events SET updated_at = now()");
    if let Some(name) = body.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(t) = r#type {
        qb.push(", type = ").push_bind(t);
    }
    if let Some(description) = body.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(start) = start_date {
        qb.push(", start_date = ").push_bind(start);
    }
    if let Some(end) = end_date {
        qb.push(", end_date = ").push_bind(end);
    }
    if let Some(status) = status {
        qb.push(", status = ").push_bind(status);
    }
    if let Some(participants) = body.participants {
        qb.push(", participants = ").push_bind(participants);
    }
    if let Some(responsible) = body.responsible {
        qb.push(", responsible = ").push_bind(responsible);
    }
    if let Some(notes) = body.notes {
        qb.push(", notes = ").push_bind(notes);
    }
    if let Some(location_id) = body.location_id {
        qb.push(", location_id = ").push_bind(location_id);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(&state.pool).await?;

    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE e.id = ").push_bind(id);
    let row: EventJoinRow = qb.build_query_as().fetch_one(&state.pool).await?;
    let event_items = fetch_items_by_event(&state.pool, &[id]).await?;
    let event = row.into_detail(event_items.into_values().next().unwrap_or_default());

    Ok(response::success(
        json!({ "event": event }),
        "Event updated successfully",
    ))
}

/// DELETE /api/kegiatan/:id
///
/// Assignment rows are owned by the event; they go first, then the event.
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Event not found"));
    }

    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM event_items WHERE event_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(response::empty_success("Event deleted successfully"))
}

/// Check-out preconditions, applied after both existence checks, in the order
/// the API reports them: sufficient quantity, then no duplicate assignment.
pub(crate) fn checkout_guard(
    available: i32,
    requested: i32,
    already_assigned: bool,
) -> Result<(), AppError> {
    if available < requested {
        return Err(AppError::business("Insufficient inventory quantity"));
    }
    if already_assigned {
        return Err(AppError::business("Item is already assigned to this event"));
    }
    Ok(())
}

/// The pre-insert duplicate SELECT cannot see an uncommitted concurrent
/// assignment; the unique (event_id, inventory_id) constraint catches that
/// case at insert time and is reported as the same business error.
pub(crate) fn map_duplicate_assignment(err: sqlx::Error) -> AppError {
    if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
        return AppError::business("Item is already assigned to this event");
    }
    err.into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignItemRequest {
    pub inventory_id: Option<i32>,
    pub quantity_used: Option<i32>,
    pub condition_before: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/kegiatan/:id/items (check-out).
///
/// The assignment insert and the quantity decrement commit together; the
/// conditional decrement is the final arbiter under concurrent check-outs.
pub async fn assign_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<i32>,
    axum::Json(body): axum::Json<AssignItemRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();
    let inventory_id = match body.inventory_id {
        Some(id) => id,
        None => {
            v.push("inventoryId", "Inventory ID is required");
            0
        }
    };
    let quantity_used = match body.quantity_used {
        Some(q) if q >= 1 => q,
        _ => {
            v.push("quantityUsed", "Quantity used must be at least 1");
            0
        }
    };
    let condition_before: Option<ItemCondition> = match body.condition_before.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("conditionBefore", "Invalid condition");
                None
            }
        },
        None => {
            v.push("conditionBefore", "Invalid condition");
            None
        }
    };
    v.finish()?;

    let mut tx = state.pool.begin().await?;

    let event: Option<i32> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;
    if event.is_none() {
        return Err(AppError::not_found("Event not found"));
    }

    let inventory: Option<InventoryItem> =
        sqlx::query_as("SELECT * FROM inventory WHERE id = $1")
            .bind(inventory_id)
            .fetch_optional(&mut *tx)
            .await?;
    let inventory = inventory.ok_or_else(|| AppError::not_found("Inventory item not found"))?;

    let existing: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM event_items WHERE event_id = $1 AND inventory_id = $2",
    )
    .bind(event_id)
    .bind(inventory_id)
    .fetch_optional(&mut *tx)
    .await?;

    checkout_guard(inventory.quantity, quantity_used, existing.is_some())?;

    let assignment: EventItem = sqlx::query_as(
        "INSERT INTO event_items (event_id, inventory_id, quantity_used, condition_before, \
         notes, assigned_by) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(event_id)
    .bind(inventory_id)
    .bind(quantity_used)
    .bind(condition_before)
    .bind(body.notes)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_duplicate_assignment)?;

    let decremented = sqlx::query(
        "UPDATE inventory SET quantity = quantity - $1, updated_at = now() \
         WHERE id = $2 AND quantity >= $1",
    )
    .bind(quantity_used)
    .bind(inventory_id)
    .execute(&mut *tx)
    .await?;
    if decremented.rows_affected() == 0 {
        // A concurrent check-out won the quantity; dropping the transaction
        // rolls back the insert.
        return Err(AppError::business("Insufficient inventory quantity"));
    }

    tx.commit().await?;

    let event_item = fetch_assignment_detail(&state.pool, assignment.id).await?;

    Ok(response::created(
        json!({ "eventItem": event_item }),
        "Item assigned to event successfully",
    ))
}

async fn fetch_assignment_detail(
    pool: &PgPool,
    id: i32,
) -> Result<Option<EventItemDetail>, AppError> {
    let row: Option<EventItemAssignerRow> = sqlx::query_as(
        "SELECT ei.*, u.username AS assigner_username, u.full_name AS assigner_full_name \
         FROM event_items ei LEFT JOIN users u ON u.id = ei.assigned_by WHERE ei.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let inventory: Option<InventoryItem> =
        sqlx::query_as("SELECT * FROM inventory WHERE id = $1")
            .bind(row.item.inventory_id)
            .fetch_optional(pool)
            .await?;

    Ok(Some(row.into_detail(inventory)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItemRequest {
    pub condition_after: Option<String>,
    pub notes: Option<String>,
    pub returned_date: Option<String>,
}

/// PUT /api/kegiatan/:id/items/:item_id (check-in).
///
/// The item's global condition is overwritten by this return's
/// `conditionAfter`, even if other assignments are still out.
pub async fn update_item_condition(
    State(state): State<AppState>,
    user: AuthUser,
    Path((event_id, item_id)): Path<(i32, i32)>,
    axum::Json(body): axum::Json<ReturnItemRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();
    let condition_after: Option<ItemCondition> = match body.condition_after.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("conditionAfter", "Invalid condition");
                None
            }
        },
        None => {
            v.push("conditionAfter", "Invalid condition");
            None
        }
    };
    let returned_date = match body.returned_date.as_deref() {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push("returnedDate", "Valid returned date is required");
                None
            }
        },
        None => None,
    };
    v.finish()?;
    let Some(condition_after) = condition_after else {
        return Err(AppError::Internal("condition missing after validation".into()));
    };

    // Scoped to both ids so an assignment of another event cannot be
    // returned through this one.
    let assignment: Option<EventItem> =
        sqlx::query_as("SELECT * FROM event_items WHERE id = $1 AND event_id = $2")
            .bind(item_id)
            .bind(event_id)
            .fetch_optional(&state.pool)
            .await?;
    let assignment = assignment.ok_or_else(|| AppError::not_found("Event item not found"))?;

    let returned_date = returned_date.unwrap_or_else(Utc::now);

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "UPDATE event_items SET condition_after = $1, notes = COALESCE($2, notes), \
         returned_date = $3, updated_at = now() WHERE id = $4",
    )
    .bind(condition_after)
    .bind(body.notes)
    .bind(returned_date)
    .bind(assignment.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE inventory SET quantity = quantity + $1, condition = $2, updated_at = now() \
         WHERE id = $3",
    )
    .bind(assignment.quantity_used)
    .bind(condition_after)
    .bind(assignment.inventory_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    let event_item = fetch_assignment_detail(&state.pool, assignment.id).await?;

    Ok(response::success(
        json!({ "eventItem": event_item }),
        "Item condition updated successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn end_before_start_is_refused() {
        let start = ts("2024-05-02 09:00:00");
        let end = ts("2024-05-01 17:00:00");
        assert!(matches!(
            check_date_range(start, end),
            Err(AppError::BusinessRule(_))
        ));
    }

    #[test]
    fn equal_start_and_end_are_accepted() {
        let t = ts("2024-05-02 09:00:00");
        assert!(check_date_range(t, t).is_ok());
    }

    #[test]
    fn checkout_needs_sufficient_quantity() {
        assert!(checkout_guard(5, 3, false).is_ok());
        assert!(checkout_guard(3, 3, false).is_ok());
        assert!(matches!(
            checkout_guard(2, 3, false),
            Err(AppError::BusinessRule(msg)) if msg == "Insufficient inventory quantity"
        ));
    }

    #[test]
    fn checkout_rejects_duplicate_assignment() {
        assert!(matches!(
            checkout_guard(5, 3, true),
            Err(AppError::BusinessRule(msg)) if msg == "Item is already assigned to this event"
        ));
    }

    #[test]
    fn quantity_check_outranks_duplicate_check() {
        // Both guards trip; the reported reason is the quantity one.
        assert!(matches!(
            checkout_guard(2, 3, true),
            Err(AppError::BusinessRule(msg)) if msg == "Insufficient inventory quantity"
        ));
    }

    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    // Two concurrent check-outs of the same pair can both pass the SELECT
    // guard; the loser's insert then hits the unique constraint and must
    // surface as the duplicate-assignment business error, not a 500.
    #[test]
    fn concurrent_duplicate_insert_reports_already_assigned() {
        let err = sqlx::Error::Database(Box::new(DuplicateKey));
        assert!(matches!(
            map_duplicate_assignment(err),
            AppError::BusinessRule(msg) if msg == "Item is already assigned to this event"
        ));
    }

    #[test]
    fn other_database_errors_pass_through() {
        assert!(matches!(
            map_duplicate_assignment(sqlx::Error::RowNotFound),
            AppError::Database(_)
        ));
    }
}
