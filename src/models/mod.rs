pub mod enums;
pub mod event;
pub mod event_item;
pub mod inventory;
pub mod location;
pub mod user;
