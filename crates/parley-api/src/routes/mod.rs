pub mod health;
pub mod messages;
pub mod providers;
pub mod sessions;
pub mod users;
