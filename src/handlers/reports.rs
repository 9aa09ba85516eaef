use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, QueryBuilder};

use crate::auth::AuthUser;
use crate::handlers::{events, inventory};
use crate::models::event::{EventDetail, EventJoinRow};
use crate::models::event_item::EventItemWithInventory;
use crate::models::inventory::{InventoryDetail, InventoryItem, InventoryJoinRow};
use crate::utils::datetime::parse_iso_datetime;
use crate::utils::error::{AppError, Validator};
use crate::utils::response;
use crate::AppState;

fn parse_date_filter(
    raw: Option<&str>,
    field: &str,
    message: &str,
    v: &mut Validator,
) -> Option<DateTime<Utc>> {
    match raw {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push(field, message);
                None
            }
        },
        None => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location_id: Option<String>,
}

async fn fetch_inventory_report(
    pool: &PgPool,
    q: &InventoryReportQuery,
) -> Result<Vec<InventoryDetail>, AppError> {
    let mut v = Validator::default();
    let start = parse_date_filter(
        q.start_date.as_deref(),
        "startDate",
        "Valid start date is required",
        &mut v,
    );
    let end = parse_date_filter(
        q.end_date.as_deref(),
        "endDate",
        "Valid end date is required",
        &mut v,
    );
    let filters = inventory::parse_filters(
        None,
        q.category.as_deref(),
        q.condition.as_deref(),
        q.location_id.as_deref(),
        &mut v,
    );
    v.finish()?;

    let mut qb = QueryBuilder::new(inventory::JOIN_SELECT);
    qb.push(" WHERE 1=1");
    // The acquisition-date range applies only when both bounds are given.
    if let (Some(start), Some(end)) = (start, end) {
        qb.push(" AND i.acquisition_date BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }
    inventory::push_filters(&mut qb, &filters);
    qb.push(" ORDER BY i.created_at DESC");

    let rows: Vec<InventoryJoinRow> = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().map(InventoryJoinRow::into_detail).collect())
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportSummary {
    pub total_items: usize,
    pub total_value: Decimal,
    pub condition_summary: BTreeMap<&'static str, i64>,
    pub category_summary: BTreeMap<&'static str, i64>,
}

pub(crate) fn summarize_inventory<'a>(
    items: impl IntoIterator<Item = &'a InventoryItem>,
) -> InventoryReportSummary {
    let mut summary = InventoryReportSummary {
        total_items: 0,
        total_value: Decimal::ZERO,
        condition_summary: BTreeMap::new(),
        category_summary: BTreeMap::new(),
    };

    for item in items {
        summary.total_items += 1;
        summary.total_value += item.acquisition_value.unwrap_or(Decimal::ZERO);
        *summary
            .condition_summary
            .entry(item.condition.as_str())
            .or_insert(0) += 1;
        *summary
            .category_summary
            .entry(item.category.as_str())
            .or_insert(0) += 1;
    }

    summary
}

/// GET /api/reports/inventory
pub async fn inventory_report(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<InventoryReportQuery>,
) -> Result<Response, AppError> {
    let items = fetch_inventory_report(&state.pool, &q).await?;
    let summary = summarize_inventory(items.iter().map(|d| &d.item));

    Ok(response::success_data(json!({
        "inventory": items,
        "summary": summary,
        "filters": {
            "startDate": q.start_date,
            "endDate": q.end_date,
            "category": q.category,
            "condition": q.condition,
            "locationId": q.location_id,
        },
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub status: Option<String>,
}

async fn fetch_event_report(
    pool: &PgPool,
    q: &EventReportQuery,
) -> Result<Vec<EventDetail<EventItemWithInventory>>, AppError> {
    let mut v = Validator::default();
    let start = parse_date_filter(
        q.start_date.as_deref(),
        "startDate",
        "Valid start date is required",
        &mut v,
    );
    let end = parse_date_filter(
        q.end_date.as_deref(),
        "endDate",
        "Valid end date is required",
        &mut v,
    );
    let mut filters = events::EventFilters::default();
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
    v.finish()?;

    let mut qb = QueryBuilder::new(events::JOIN_SELECT);
    qb.push(" WHERE 1=1");
    if let (Some(start), Some(end)) = (start, end) {
        qb.push(" AND e.start_date BETWEEN ")
            .push_bind(start)
            .push(" AND ")
            .push_bind(end);
    }
    events::push_filters(&mut qb, &filters);
    qb.push(" ORDER BY e.start_date DESC");

    let rows: Vec<EventJoinRow> = qb.build_query_as().fetch_all(pool).await?;

    let ids: Vec<i32> = rows.iter().map(|r| r.event.id).collect();
    let mut items = events::fetch_items_by_event(pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let event_items = items.remove(&row.event.id).unwrap_or_default();
            row.into_detail(event_items)
        })
        .collect())
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventReportSummary {
    pub total_events: usize,
    pub total_participants: i64,
    pub total_items_used: i64,
    pub type_summary: BTreeMap<&'static str, i64>,
    pub status_summary: BTreeMap<&'static str, i64>,
}

pub(crate) fn summarize_events(
    events: &[EventDetail<EventItemWithInventory>],
) -> EventReportSummary {
    let mut summary = EventReportSummary {
        total_events: events.len(),
        total_participants: 0,
        total_items_used: 0,
        type_summary: BTreeMap::new(),
        status_summary: BTreeMap::new(),
    };

    for detail in events {
        summary.total_participants += i64::from(detail.event.participants.unwrap_or(0));
        summary.total_items_used += detail
            .event_items
            .iter()
            .map(|ei| i64::from(ei.item.quantity_used))
            .sum::<i64>();
        *summary
            .type_summary
            .entry(detail.event.r#type.as_str())
            .or_insert(0) += 1;
        *summary
            .status_summary
            .entry(detail.event.status.as_str())
            .or_insert(0) += 1;
    }

    summary
}

/// GET /api/reports/events
pub async fn event_report(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<EventReportQuery>,
) -> Result<Response, AppError> {
    let events = fetch_event_report(&state.pool, &q).await?;
    let summary = summarize_events(&events);

    Ok(response::success_data(json!({
        "events": events,
        "summary": summary,
        "filters": {
            "startDate": q.start_date,
            "endDate": q.end_date,
            "type": q.r#type,
            "status": q.status,
        },
    })))
}

fn attachment(content_type: &'static str, filename: String, bytes: Vec<u8>) -> Response {
    use axum::http::header;
    use axum::response::IntoResponse;

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response()
}

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// GET /api/reports/inventory/export/pdf
pub async fn export_inventory_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<InventoryReportQuery>,
) -> Result<Response, AppError> {
    let items = fetch_inventory_report(&state.pool, &q).await?;
    let bytes = crate::export::pdf::inventory_pdf(&items)?;
    let filename = format!("inventory-report-{}.pdf", Utc::now().timestamp_millis());
    Ok(attachment("application/pdf", filename, bytes))
}

/// GET /api/reports/inventory/export/excel
pub async fn export_inventory_excel(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<InventoryReportQuery>,
) -> Result<Response, AppError> {
    let items = fetch_inventory_report(&state.pool, &q).await?;
    let bytes = crate::export::excel::inventory_excel(&items)?;
    let filename = format!("inventory-report-{}.xlsx", Utc::now().timestamp_millis());
    Ok(attachment(XLSX_CONTENT_TYPE, filename, bytes))
}

/// GET /api/reports/events/export/pdf
pub async fn export_events_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<EventReportQuery>,
) -> Result<Response, AppError> {
    let events = fetch_event_report(&state.pool, &q).await?;
    let bytes = crate::export::pdf::events_pdf(&events)?;
    let filename = format!("events-report-{}.pdf", Utc::now().timestamp_millis());
    Ok(attachment("application/pdf", filename, bytes))
}

/// GET /api/reports/events/export/excel
pub async fn export_events_excel(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<EventReportQuery>,
) -> Result<Response, AppError> {
    let events = fetch_event_report(&state.pool, &q).await?;
    let bytes = crate::export::excel::events_excel(&events)?;
    let filename = format!("events-report-{}.xlsx", Utc::now().timestamp_millis());
    Ok(attachment(XLSX_CONTENT_TYPE, filename, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{EventStatus, EventType, ItemCategory, ItemCondition};
    use crate::models::event::Event;
    use crate::models::event_item::EventItem;

    fn sample_item(
        id: i32,
        category: ItemCategory,
        condition: ItemCondition,
        value: Option<&str>,
    ) -> InventoryItem {
        InventoryItem {
            id,
            name: format!("Item {id}"),
            category,
            specification: None,
            brand: None,
            model: None,
            serial_number: None,
            quantity: 1,
            condition,
            acquisition_date: None,
            acquisition_value: value.map(|v| v.parse().unwrap()),
            responsible: None,
            photo: None,
            qr_code: None,
            notes: None,
            location_id: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_event(
        id: i32,
        r#type: EventType,
        status: EventStatus,
        participants: Option<i32>,
        quantities: &[i32],
    ) -> EventDetail<EventItemWithInventory> {
        let event = Event {
            id,
            name: format!("Event {id}"),
            r#type,
            description: None,
            start_date: Utc::now(),
            end_date: Utc::now(),
            status,
            participants,
            responsible: "Rina".to_string(),
            notes: None,
            location_id: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let event_items = quantities
            .iter()
            .enumerate()
            .map(|(i, &quantity_used)| EventItemWithInventory {
                item: EventItem {
                    id: i as i32 + 1,
                    event_id: id,
                    inventory_id: i as i32 + 100,
                    quantity_used,
                    condition_before: ItemCondition::Good,
                    condition_after: None,
                    notes: None,
                    assigned_date: Utc::now(),
                    returned_date: None,
                    assigned_by: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
                inventory: None,
            })
            .collect();
        EventDetail {
            event,
            location: None,
            creator: None,
            event_items,
        }
    }

    #[test]
    fn inventory_summary_counts_and_sums() {
        let items = vec![
            sample_item(1, ItemCategory::Electronics, ItemCondition::Good, Some("1500.50")),
            sample_item(2, ItemCategory::Electronics, ItemCondition::LightlyDamaged, None),
            sample_item(3, ItemCategory::Furniture, ItemCondition::Good, Some("200")),
        ];

        let summary = summarize_inventory(&items);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_value, "1700.50".parse().unwrap());
        assert_eq!(summary.condition_summary["Good"], 2);
        assert_eq!(summary.condition_summary["LightlyDamaged"], 1);
        assert_eq!(summary.category_summary["Electronics"], 2);
        assert_eq!(summary.category_summary["Furniture"], 1);
    }

    #[test]
    fn empty_inventory_summary_is_zeroed() {
        let summary = summarize_inventory(&[]);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.total_value, Decimal::ZERO);
        assert!(summary.condition_summary.is_empty());
    }

    #[test]
    fn event_summary_totals_participants_and_items() {
        let events = vec![
            sample_event(1, EventType::Training, EventStatus::Completed, Some(25), &[3, 2]),
            sample_event(2, EventType::Training, EventStatus::Scheduled, None, &[4]),
            sample_event(3, EventType::Meeting, EventStatus::Scheduled, Some(10), &[]),
        ];

        let summary = summarize_events(&events);
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.total_participants, 35);
        assert_eq!(summary.total_items_used, 9);
        assert_eq!(summary.type_summary["training"], 2);
        assert_eq!(summary.type_summary["meeting"], 1);
        assert_eq!(summary.status_summary["scheduled"], 2);
        assert_eq!(summary.status_summary["completed"], 1);
    }
}
