use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Asset categories. Closed set; report grouping and filters match
/// exhaustively so a new category cannot be silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_category")]
pub enum ItemCategory {
    Furniture,
    Electronics,
    Tools,
    Vehicles,
    Books,
    Equipment,
    Others,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 7] = [
        ItemCategory::Furniture,
        ItemCategory::Electronics,
        ItemCategory::Tools,
        ItemCategory::Vehicles,
        ItemCategory::Books,
        ItemCategory::Equipment,
        ItemCategory::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Furniture => "Furniture",
            ItemCategory::Electronics => "Electronics",
            ItemCategory::Tools => "Tools",
            ItemCategory::Vehicles => "Vehicles",
            ItemCategory::Books => "Books",
            ItemCategory::Equipment => "Equipment",
            ItemCategory::Others => "Others",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// Physical condition of an item, both its current state and the
/// before/after snapshots on an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_condition")]
pub enum ItemCondition {
    Good,
    LightlyDamaged,
    HeavilyDamaged,
    Lost,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 4] = [
        ItemCondition::Good,
        ItemCondition::LightlyDamaged,
        ItemCondition::HeavilyDamaged,
        ItemCondition::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::Good => "Good",
            ItemCondition::LightlyDamaged => "LightlyDamaged",
            ItemCondition::HeavilyDamaged => "HeavilyDamaged",
            ItemCondition::Lost => "Lost",
        }
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCondition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Exam,
    Training,
    Workshop,
    Meeting,
    Seminar,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Exam,
        EventType::Training,
        EventType::Workshop,
        EventType::Meeting,
        EventType::Seminar,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Exam => "exam",
            EventType::Training => "training",
            EventType::Workshop => "workshop",
            EventType::Meeting => "meeting",
            EventType::Seminar => "seminar",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// Event lifecycle status. Transitions are free-form: any valid status may be
/// written over any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Scheduled,
        EventStatus::Active,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|s2| s2.as_str() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_round_trip_through_json() {
        for category in ItemCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            let back: ItemCategory = serde_json::from_str(&json).unwrap();
            assert_eq!(back, category);
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn conditions_parse_from_wire_strings() {
        assert_eq!(
            "LightlyDamaged".parse::<ItemCondition>(),
            Ok(ItemCondition::LightlyDamaged)
        );
        assert!("Broken".parse::<ItemCondition>().is_err());
    }

    #[test]
    fn event_types_are_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&EventType::Exam).unwrap(), "\"exam\"");
        assert_eq!("seminar".parse::<EventType>(), Ok(EventType::Seminar));
        assert!("Seminar".parse::<EventType>().is_err());
    }

    #[test]
    fn statuses_parse_from_wire_strings() {
        for status in EventStatus::ALL {
            assert_eq!(status.as_str().parse::<EventStatus>(), Ok(status));
        }
        assert!("archived".parse::<EventStatus>().is_err());
    }
}
