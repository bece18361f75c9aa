pub mod auth;
pub mod core;
pub mod fees;
pub mod print;
pub mod reports;
pub mod students;
