pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod i18n;
pub mod models;
pub mod observability;
pub mod state;
pub mod storage;
