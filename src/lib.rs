pub mod app;
pub mod config;
pub mod fallback;
pub mod format;
pub mod models;
pub mod tmdb;
pub mod ui;
