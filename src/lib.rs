pub mod api;
pub mod config;
pub mod error;
pub mod highscores;
pub mod levels;
pub mod metrics;
