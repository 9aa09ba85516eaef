use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::auth::AuthUser;
use crate::models::location::{Location, LocationItemSummary, LocationWithItems};
use crate::utils::error::{AppError, Validator};
use crate::utils::pagination::Pagination;
use crate::utils::response;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLocationsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub building: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Default)]
struct LocationFilters {
    search: Option<String>,
    building: Option<String>,
    is_active: Option<bool>,
}

fn push_filters(qb: &mut QueryBuilder<Postgres>, filters: &LocationFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (l.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.building ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(building) = &filters.building {
        qb.push(" AND l.building = ").push_bind(building.clone());
    }
    if let Some(is_active) = filters.is_active {
        qb.push(" AND l.is_active = ").push_bind(is_active);
    }
}

async fn fetch_items_by_location(
    pool: &PgPool,
    location_ids: &[i32],
) -> Result<HashMap<i32, Vec<LocationItemSummary>>, AppError> {
    let items: Vec<LocationItemSummary> = sqlx::query_as(
        "SELECT id, name, category, condition, location_id \
         FROM inventory WHERE location_id = ANY($1) ORDER BY name",
    )
    .bind(location_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i32, Vec<LocationItemSummary>> = HashMap::new();
    for item in items {
        if let Some(location_id) = item.location_id {
            grouped.entry(location_id).or_default().push(item);
        }
    }
    Ok(grouped)
}

/// GET /api/locations
pub async fn list_locations(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(q): Query<ListLocationsQuery>,
) -> Result<Response, AppError> {
    let mut v = Validator::default();
    let pagination = Pagination::from_query(q.page.as_deref(), q.limit.as_deref(), &mut v);
    v.finish()?;

    let filters = LocationFilters {
        search: q.search,
        building: q.building,
        is_active: q.is_active.as_deref().map(|raw| raw == "true"),
    };

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM locations l WHERE 1=1");
    push_filters(&mut count_qb, &filters);
    let total: i64 = count_qb.build_query_scalar().fetch_one(&state.pool).await?;

    let mut qb = QueryBuilder::new("SELECT l.* FROM locations l WHERE 1=1");
    push_filters(&mut qb, &filters);
    qb.push(" ORDER BY l.created_at DESC LIMIT ")
        .push_bind(pagination.limit)
        .push(" OFFSET ")
        .push_bind(pagination.offset());

    let locations: Vec<Location> = qb.build_query_as().fetch_all(&state.pool).await?;

    let ids: Vec<i32> = locations.iter().map(|l| l.id).collect();
    let mut items = fetch_items_by_location(&state.pool, &ids).await?;

    let locations: Vec<LocationWithItems> = locations
        .into_iter()
        .map(|location| {
            let inventory_items = items.remove(&location.id).unwrap_or_default();
            LocationWithItems {
                location,
                inventory_items,
            }
        })
        .collect();

    Ok(response::success_data(json!({
        "locations": locations,
        "pagination": pagination.meta(total),
    })))
}

/// GET /api/locations/:id
pub async fn get_location(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let location: Option<Location> = sqlx::query_as("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let location = location.ok_or_else(|| AppError::not_found("Location not found"))?;

    let mut items = fetch_items_by_location(&state.pool, &[id]).await?;
    let detail = LocationWithItems {
        location,
        inventory_items: items.remove(&id).unwrap_or_default(),
    };

    Ok(response::success_data(json!({ "location": detail })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub room_number: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

pub(crate) fn validate_capacity(capacity: Option<i32>, v: &mut Validator) {
    if let Some(capacity) = capacity {
        if capacity < 0 {
            v.push("capacity", "Capacity must be a non-negative integer");
        }
    }
}

async fn name_taken(pool: &PgPool, name: &str, exclude_id: Option<i32>) -> Result<bool, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM locations WHERE name = ");
    qb.push_bind(name);
    if let Some(id) = exclude_id {
        qb.push(" AND id <> ").push_bind(id);
    }
    let existing: Option<i32> = qb.build_query_scalar().fetch_optional(pool).await?;
    Ok(existing.is_some())
}

/// POST /api/locations
pub async fn create_location(
    State(state): State<AppState>,
    user: AuthUser,
    axum::Json(body): axum::Json<CreateLocationRequest>,
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
    validate_capacity(body.capacity, &mut v);
    v.finish()?;

    if name_taken(&state.pool, &name, None).await? {
        return Err(AppError::business("Location with this name already exists"));
    }

    let location: Location = sqlx::query_as(
        "INSERT INTO locations (name, description, building, floor, room_number, capacity, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(name)
    .bind(body.description)
    .bind(body.building)
    .bind(body.floor)
    .bind(body.room_number)
    .bind(body.capacity.unwrap_or(0))
    .bind(body.is_active.unwrap_or(true))
    .fetch_one(&state.pool)
    .await?;

    Ok(response::created(
        json!({ "location": location }),
        "Location created successfully",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub room_number: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

/// PUT /api/locations/:id
pub async fn update_location(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    axum::Json(body): axum::Json<UpdateLocationRequest>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let mut v = Validator::default();
    if let Some(name) = body.name.as_deref() {
        if name.trim().is_empty() {
            v.push("name", "Name cannot be empty");
        }
    }
    validate_capacity(body.capacity, &mut v);
    v.finish()?;

    let current: Option<Location> = sqlx::query_as("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let current = current.ok_or_else(|| AppError::not_found("Location not found"))?;

    // Uniqueness re-checked only when the name actually changes.
    if let Some(name) = body.name.as_deref() {
        if name != current.name && name_taken(&state.pool, name, Some(id)).await? {
            return Err(AppError::business("Location with this name already exists"));
        }
    }

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE locations SET updated_at = now()");
    if let Some(name) = body.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(description) = body.description {
        qb.push(", description = ").push_bind(description);
    }
    if let Some(building) = body.building {
        qb.push(", building = ").push_bind(building);
    }
    if let Some(floor) = body.floor {
        qb.push(", floor = ").push_bind(floor);
    }
    if let Some(room_number) = body.room_number {
        qb.push(", room_number = ").push_bind(room_number);
    }
    if let Some(capacity) = body.capacity {
        qb.push(", capacity = ").push_bind(capacity);
    }
    if let Some(is_active) = body.is_active {
        qb.push(", is_active = ").push_bind(is_active);
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(&state.pool).await?;

    let location: Location = sqlx::query_as("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;

    Ok(response::success(
        json!({ "location": location }),
        "Location updated successfully",
    ))
}

/// DELETE /api/locations/:id
pub async fn delete_location(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    user.require_supervisor()?;

    let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("Location not found"));
    }

    let item_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE location_id = $1")
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
    if item_count > 0 {
        return Err(AppError::business(
            "Cannot delete location that contains inventory items. \
             Please move or delete the items first.",
        ));
    }

    sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(response::empty_success("Location deleted successfully"))
}

/// GET /api/locations/stats/summary
pub async fn location_stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let total_locations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE is_active = TRUE")
            .fetch_one(&state.pool)
            .await?;

    let rows: Vec<(i32, String, Option<String>, i64)> = sqlx::query_as(
        "SELECT l.id, l.name, l.building, COUNT(i.id) \
         FROM locations l LEFT JOIN inventory i ON i.location_id = l.id \
         GROUP BY l.id, l.name, l.building ORDER BY l.name",
    )
    .fetch_all(&state.pool)
    .await?;

    let location_stats: Vec<_> = rows
        .into_iter()
        .map(|(id, name, building, item_count)| {
            json!({
                "id": id,
                "name": name,
                "building": building,
                "itemCount": item_count,
            })
        })
        .collect();

    Ok(response::success_data(json!({
        "totalLocations": total_locations,
        "locationStats": location_stats,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_capacity_is_a_field_error() {
        let mut v = Validator::default();
        validate_capacity(Some(-1), &mut v);
        assert!(!v.is_empty());
    }

    #[test]
    fn zero_and_absent_capacity_pass() {
        let mut v = Validator::default();
        validate_capacity(Some(0), &mut v);
        validate_capacity(None, &mut v);
        assert!(v.is_empty());
    }
}
