use serde::Serialize;

/// Creator/assigner display fields. User management itself lives outside this
/// service; rows are only ever read through joins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub full_name: String,
    pub username: String,
}
