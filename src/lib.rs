pub mod cli;
pub mod client;
pub mod config;
pub mod pages;
pub mod server;
pub mod session;
pub mod table;
