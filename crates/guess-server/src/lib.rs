pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod round;
pub mod routes;
pub mod session;
