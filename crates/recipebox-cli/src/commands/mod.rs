//! Command handlers

pub mod category;
pub mod config;
pub mod recipe;
pub mod status;
