pub mod auth;
pub mod browse;
pub mod serve;
pub mod table;
