pub mod assignments;
pub mod auth;
pub mod catalog;
pub mod me;
pub mod offices;
pub mod sessions;
pub mod users;
