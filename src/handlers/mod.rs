pub mod events;
pub mod inventory;
pub mod locations;
pub mod reports;
pub mod system;
