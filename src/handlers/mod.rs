// src/handlers/mod.rs
pub mod generate;
pub mod jobs;
pub mod scenes;
pub mod status;
pub mod ui;
pub mod upload;
