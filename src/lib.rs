pub mod acquire;
pub mod alpha_bleed;
pub mod api;
pub mod candidates;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod icon;
pub mod logging;
