use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::enums::{EventStatus, EventType};
use crate::models::location::LocationSummary;
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: EventType,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: EventStatus,
    pub participants: Option<i32>,
    pub responsible: String,
    pub notes: Option<String>,
    pub location_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row from the event list/detail joins.
#[derive(Debug, FromRow)]
pub struct EventJoinRow {
    #[sqlx(flatten)]
    pub event: Event,
    pub location_name: Option<String>,
    pub location_building: Option<String>,
    pub location_floor: Option<String>,
    pub creator_username: Option<String>,
    pub creator_full_name: Option<String>,
}

impl EventJoinRow {
    pub fn into_detail<I: Serialize>(self, event_items: Vec<I>) -> EventDetail<I> {
        let location = match (self.event.location_id, self.location_name) {
            (Some(id), Some(name)) => Some(LocationSummary {
                id,
                name,
                building: self.location_building,
                floor: self.location_floor,
            }),
            _ => None,
        };

        let creator = match (
            self.event.created_by,
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

        EventDetail {
            event: self.event,
            location,
            creator,
            event_items,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail<I: Serialize> {
    #[serde(flatten)]
    pub event: Event,
    pub location: Option<LocationSummary>,
    pub creator: Option<UserSummary>,
    pub event_items: Vec<I>,
}
