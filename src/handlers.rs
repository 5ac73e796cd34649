pub mod analytics;
pub mod deals;
pub mod health;
pub mod plans;
pub mod returns;
pub mod users;
