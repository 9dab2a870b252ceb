//! Command handlers

pub mod admin;
pub mod config;
pub mod serve;
pub mod sweep;
