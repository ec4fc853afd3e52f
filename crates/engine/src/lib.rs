pub mod api;
pub mod assistant;
pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod state;
pub mod widget;
