pub mod app;
pub mod clipboard;
pub mod components;
pub mod config;
