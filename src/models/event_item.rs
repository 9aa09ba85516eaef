use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::{ItemCategory, ItemCondition};
use crate::models::inventory::{InventoryItem, InventorySummary};
use crate::models::user::UserSummary;

/// One assignment of an inventory item to an event. Owned by the event; only
/// ever deleted through the event's caller-side cascade.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub id: i32,
    pub event_id: i32,
    pub inventory_id: i32,
    pub quantity_used: i32,
    pub condition_before: ItemCondition,
    pub condition_after: Option<ItemCondition>,
    pub notes: Option<String>,
    pub assigned_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub assigned_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List-shape row: the assignment plus its inventory's id/name/category.
#[derive(Debug, FromRow)]
pub struct EventItemJoinRow {
    #[sqlx(flatten)]
    pub item: EventItem,
    pub inventory_name: Option<String>,
    pub inventory_category: Option<ItemCategory>,
}

impl EventItemJoinRow {
    pub fn into_summary(self) -> EventItemWithInventory {
        let inventory = match (self.inventory_name, self.inventory_category) {
            (Some(name), Some(category)) => Some(InventorySummary {
                id: self.item.inventory_id,
                name,
                category,
            }),
            _ => None,
        };
        EventItemWithInventory {
            item: self.item,
            inventory,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItemWithInventory {
    #[serde(flatten)]
    pub item: EventItem,
    pub inventory: Option<InventorySummary>,
}

/// Detail-shape row: the assignment plus its assigner's display fields, used
/// together with a full inventory lookup.
#[derive(Debug, FromRow)]
pub struct EventItemAssignerRow {
    #[sqlx(flatten)]
    pub item: EventItem,
    pub assigner_username: Option<String>,
    pub assigner_full_name: Option<String>,
}

impl EventItemAssignerRow {
    pub fn into_detail(self, inventory: Option<InventoryItem>) -> EventItemDetail {
        let assigned_by_user = match (
            self.item.assigned_by,
            self.assigner_full_name,
            self.assigner_username,
        ) {
            (Some(id), Some(full_name), Some(username)) => Some(UserSummary {
                id,
                full_name,
                username,
            }),
            _ => None,
        };
        EventItemDetail {
            item: self.item,
            inventory,
            assigned_by_user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItemDetail {
    #[serde(flatten)]
    pub item: EventItem,
    pub inventory: Option<InventoryItem>,
    pub assigned_by_user: Option<UserSummary>,
}
