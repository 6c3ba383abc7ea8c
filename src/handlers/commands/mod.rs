//! Command handlers

pub mod admin;
pub mod start;
pub mod subscription;
pub mod wallet;
