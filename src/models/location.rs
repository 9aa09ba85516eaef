use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::{ItemCategory, ItemCondition};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub room_number: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short form embedded in inventory and event payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: i32,
    pub name: String,
    pub building: Option<String>,
    pub floor: Option<String>,
}

/// Item summary carried by location list/detail responses.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LocationItemSummary {
    pub id: i32,
    pub name: String,
    pub category: ItemCategory,
    pub condition: ItemCondition,
    #[serde(skip_serializing)]
    pub location_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationWithItems {
    #[serde(flatten)]
    pub location: Location,
    pub inventory_items: Vec<LocationItemSummary>,
}
