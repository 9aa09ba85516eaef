use axum::extract::{Path, Query, State};
use axum::response::Response;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::auth::AuthUser;
use crate::models::enums::{ItemCategory, ItemCondition};
use crate::models::inventory::{InventoryDetail, InventoryItem, InventoryJoinRow};
use crate::utils::datetime::parse_iso_datetime;
use crate::utils::error::{AppError, Validator};
use crate::utils::pagination::Pagination;
use crate::utils::response;
use crate::AppState;

pub(crate) const JOIN_SELECT: &str = "SELECT i.*, \
    l.name AS location_name, l.building AS location_building, l.floor AS location_floor, \
    u.username AS creator_username, u.full_name AS creator_full_name \
    FROM inventory i \
    LEFT JOIN locations l ON l.id = i.location_id \
    LEFT JOIN users u ON u.id = i.created_by";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInventoryQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct InventoryFilters {
    pub search: Option<String>,
    pub category: Option<ItemCategory>,
    pub condition: Option<ItemCondition>,
    pub location_id: Option<i32>,
}

pub(crate) fn parse_filters(
    search: Option<&str>,
    category: Option<&str>,
    condition: Option<&str>,
    location_id: Option<&str>,
    v: &mut Validator,
) -> InventoryFilters {
    let mut filters = InventoryFilters {
        search: search.map(str::to_owned),
        ..Default::default()
    };

    if let Some(raw) = category {
        match raw.parse() {
            Ok(c) => filters.category = Some(c),
            Err(()) => v.push("category", "Invalid category"),
        }
    }
    if let Some(raw) = condition {
        match raw.parse() {
            Ok(c) => filters.condition = Some(c),
            Err(()) => v.push("condition", "Invalid condition"),
        }
    }
    if let Some(raw) = location_id {
        match raw.parse::<i32>() {
            Ok(id) => filters.location_id = Some(id),
            Err(_) => v.push("locationId", "Location ID must be an integer"),
        }
    }

    filters
}

pub(crate) fn push_filters(qb: &mut QueryBuilder<Postgres>, filters: &InventoryFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (i.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.specification ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.model ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR i.responsible ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filters.category {
        qb.push(" AND i.category = ").push_bind(category);
    }
    if let Some(condition) = filters.condition {
        qb.push(" AND i.condition = ").push_bind(condition);
    }
    if let Some(location_id) = filters.location_id {
        qb.push(" AND i.location_id = ").push_bind(location_id);
    }
}

async fn fetch_detail(pool: &PgPool, id: i32) -> Result<Option<InventoryDetail>, AppError> {
    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE i.id = ").push_bind(id);
    let row: Option<InventoryJoinRow> = qb.build_query_as().fetch_optional(pool).await?;
    Ok(row.map(InventoryJoinRow::into_detail))
}

/// GET /api/inventory
pub async fn list_inventory(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ListInventoryQuery>,
) -> Result<Response, AppError> {
    let mut v = Validator::default();
    let pagination = Pagination::from_query(q.page.as_deref(), q.limit.as_deref(), &mut v);
    let filters = parse_filters(
        q.search.as_deref(),
        q.category.as_deref(),
        q.condition.as_deref(),
        q.location_id.as_deref(),
        &mut v,
    );
    v.finish()?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM inventory i WHERE 1=1");
    push_filters(&mut count_qb, &filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::new(JOIN_SELECT);
    qb.push(" WHERE 1=1");
    push_filters(&mut qb, &filters);
    qb.push(" ORDER BY i.created_at DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());

    let rows: Vec<InventoryJoinRow> = qb.build_query_as().fetch_all(&state.pool).await?;
    let items: Vec<InventoryDetail> = rows.into_iter().map(InventoryJoinRow::into_detail).collect();

    Ok(response::success_data(json!({
        "inventory": items,
        "pagination": pagination.meta(total),
    })))
}

/// GET /api/inventory/:id
pub async fn get_inventory(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let item = fetch_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory item not found"))?;

    Ok(response::success_data(json!({ "item": item })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub specification: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub acquisition_date: Option<String>,
    pub acquisition_value: Option<Decimal>,
    pub responsible: Option<String>,
    pub photo: Option<String>,
    pub qr_code: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
}

/// POST /api/inventory
pub async fn create_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(body): axum::Json<CreateInventoryRequest>,
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
    let category: Option<ItemCategory> = match body.category.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("category", "Invalid category");
                None
            }
        },
        None => {
            v.push("category", "Invalid category");
            None
        }
    };
    let quantity = match body.quantity {
        Some(q) if q >= 1 => q,
        _ => {
            v.push("quantity", "Quantity must be at least 1");
            0
        }
    };
    let condition: Option<ItemCondition> = match body.condition.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("condition", "Invalid condition");
                None
            }
        },
        None => {
            v.push("condition", "Invalid condition");
            None
        }
    };
    let acquisition_date = match body.acquisition_date.as_deref() {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push("acquisitionDate", "Valid acquisition date is required");
                None
            }
        },
        None => None,
    };
    v.finish()?;

    let created: InventoryItem = sqlx::query_as(
        "INSERT INTO inventory (name, category, specification, brand, model, serial_number, \
         quantity, condition, acquisition_date, acquisition_value, responsible, photo, qr_code, \
         notes, location_id, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING *",
    )
    .bind(name)
    .bind(category)
    .bind(body.specification)
    .bind(body.brand)
    .bind(body.model)
    .bind(body.serial_number)
    .bind(quantity)
    .bind(condition)
    .bind(acquisition_date)
    .bind(body.acquisition_value)
    .bind(body.responsible)
    .bind(body.photo)
    .bind(body.qr_code)
    .bind(body.notes)
    .bind(body.location_id)
    .bind(user.id)
    .fetch_one(&state.pool)
    .await?;

    let item = fetch_detail(&state.pool, created.id).await?;

    Ok(response::created(
        json!({ "item": item }),
        "Inventory item created successfully",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub specification: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: Option<i32>,
    pub condition: Option<String>,
    pub acquisition_date: Option<String>,
    pub acquisition_value: Option<Decimal>,
    pub responsible: Option<String>,
    pub photo: Option<String>,
    pub qr_code: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
}

/// PUT /api/inventory/:id
pub async fn update_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    axum::Json(body): axum::Json<UpdateInventoryRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();

    if let Some(name) = body.name.as_deref() {
        if name.trim().is_empty() {
            v.push("name", "Name cannot be empty");
        }
    }
    let category: Option<ItemCategory> = match body.category.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("category", "Invalid category");
                None
            }
        },
        None => None,
    };
    if let Some(quantity) = body.quantity {
        // Unlike create, a direct edit may zero an item out.
        if quantity < 0 {
            v.push("quantity", "Quantity must be at least 0");
        }
    }
    let condition: Option<ItemCondition> = match body.condition.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(c) => Some(c),
            Err(()) => {
                v.push("condition", "Invalid condition");
                None
            }
        },
        None => None,
    };
    let acquisition_date = match body.acquisition_date.as_deref() {
        Some(raw) => match parse_iso_datetime(raw) {
            Some(dt) => Some(dt),
            None => {
                v.push("acquisitionDate", "Valid acquisition date is required");
                None
            }
        },
        None => None,
    };
    v.finish()?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM inventory WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Inventory item not found"));
    }

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE inventory SET updated_at = now()");
    if let Some(name) = body.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(category) = category {
        qb.push(", category = ").push_bind(category);
    }
    if let Some(specification) = body.specification {
        qb.push(", specification = ").push_bind(specification);
    }
    if let Some(brand) = body.brand {
        qb.push(", brand = ").push_bind(brand);
    }
    if let Some(model) = body.model {
        qb.push(", model = ").push_bind(model);
    }
    if let Some(serial_number) = body.serial_number {
        qb.push(", serial_number = ").push_bind(serial_number);
    }
    if let Some(quantity) = body.quantity {
        qb.push(", quantity = ").push_bind(quantity);
    }
    if let Some(condition) = condition {
        qb.push(", condition = ").push_bind(condition);
    }
    if let Some(acquisition_date) = acquisition_date {
        qb.push(", acquisition_date = ").push_bind(acquisition_date);
    }
    if let Some(acquisition_value) = body.acquisition_value {
        qb.push(", acquisition_value = ").push_bind(acquisition_value);
    }
    if let Some(responsible) = body.responsible {
        qb.push(", responsible = ").push_bind(responsible);
    }
    if let Some(photo) = body.photo {
        qb.push(", photo = ").push_bind(photo);
    }
    if let Some(qr_code) = body.qr_code {
        qb.push(", qr_code = ").push_bind(qr_code);
    }
    if let Some(notes) = body.notes {
        qb.push(", notes = ").push_bind(notes);
    }
    if let Some(location_id) = body.location_id {
        qb.push(", location_id = ").push_bind(location_id);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(&state.pool).await?;

    let item = fetch_detail(&state.pool, id).await?;

    Ok(response::success(
        json!({ "item": item }),
        "Inventory item updated successfully",
    ))
}

/// DELETE /api/inventory/:id
///
/// Hard delete. Outstanding assignments are not consulted; their rows keep
/// the dangling inventory id.
pub async fn delete_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Inventory item not found"));
    }

    Ok(response::empty_success("Inventory item deleted successfully"))
}

/// GET /api/inventory/stats/summary
pub async fn inventory_stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
        .fetch_one(&state.pool)
        .await?;

    let condition_rows: Vec<(ItemCondition, i64)> =
        sqlx::query_as("SELECT condition, COUNT(*) FROM inventory GROUP BY condition")
            .fetch_all(&state.pool)
            .await?;

    let category_rows: Vec<(ItemCategory, i64)> =
        sqlx::query_as("SELECT category, COUNT(*) FROM inventory GROUP BY category")
            .fetch_all(&state.pool)
            .await?;

    let condition_stats: Vec<_> = condition_rows
        .into_iter()
        .map(|(condition, count)| json!({ "condition": condition, "count": count }))
        .collect();
    let category_stats: Vec<_> = category_rows
        .into_iter()
        .map(|(category, count)| json!({ "category": category, "count": count }))
        .collect();

    Ok(response::success_data(json!({
        "totalItems": total_items,
        "conditionStats": condition_stats,
        "categoryStats": category_stats,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse_valid_values() {
        let mut v = Validator::default();
        let f = parse_filters(
            Some("router"),
            Some("Electronics"),
            Some("Good"),
            Some("3"),
            &mut v,
        );
        assert!(v.is_empty());
        assert_eq!(f.search.as_deref(), Some("router"));
        assert_eq!(f.category, Some(ItemCategory::Electronics));
        assert_eq!(f.condition, Some(ItemCondition::Good));
        assert_eq!(f.location_id, Some(3));
    }

    #[test]
    fn invalid_enum_filters_are_field_errors() {
        let mut v = Validator::default();
        parse_filters(None, Some("Gadgets"), Some("Shiny"), Some("x"), &mut v);
        match v.finish() {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["category", "condition", "locationId"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn absent_filters_mean_no_constraints() {
        let mut v = Validator::default();
        let f = parse_filters(None, None, None, None, &mut v);
        assert!(v.is_empty());
        assert!(f.search.is_none());
        assert!(f.category.is_none());
        assert!(f.condition.is_none());
        assert!(f.location_id.is_none());
    }
}
