pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod model;
pub mod profile;
pub mod state;
pub mod storage;
