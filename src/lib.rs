pub mod api;
pub mod calendar;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod core;
pub mod google;
