pub mod analytics;
pub mod config;
pub mod geo;
pub mod models;
pub mod storage;
pub mod tracking;

pub mod api;
pub mod redirect;
