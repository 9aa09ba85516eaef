use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::{ItemCategory, ItemCondition};
use crate::models::location::LocationSummary;
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i32,
    pub name: String,
    pub category: ItemCategory,
    pub specification: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: i32,
    pub condition: ItemCondition,
    pub acquisition_date: Option<DateTime<Utc>>,
    pub acquisition_value: Option<Decimal>,
    pub responsible: Option<String>,
    pub photo: Option<String>,
    pub qr_code: Option<String>,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row produced by the list/detail joins against locations and users.
#[derive(Debug, FromRow)]
pub struct InventoryJoinRow {
    #[sqlx(flatten)]
    pub item: InventoryItem,
    pub location_name: Option<String>,
    pub location_building: Option<String>,
    pub location_floor: Option<String>,
    pub creator_username: Option<String>,
    pub creator_full_name: Option<String>,
}

impl InventoryJoinRow {
    pub fn into_detail(self) -> InventoryDetail {
        let location = match (self.item.location_id, self.location_name) {
            (Some(id), Some(name)) => Some(LocationSummary {
                id,
                name,
                building: self.location_building,
                floor: self.location_floor,
            }),
            _ => None,
        };

        let creator = match (
            self.item.created_by,
            self.creator_full_name,
            self.creator_username,
        ) {
            (Some(id), Some(full_name), Some(username)) => Some(UserSummary {
                id,
                full_name,
                username,
            }),
            _ => None,
        };

        InventoryDetail {
            item: self.item,
            location,
            creator,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDetail {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub location: Option<LocationSummary>,
    pub creator: Option<UserSummary>,
}

/// Short form embedded in event assignment payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub id: i32,
    pub name: String,
    pub category: ItemCategory,
}
