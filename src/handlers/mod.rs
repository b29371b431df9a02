//! HTTP handlers

pub mod health;
pub mod classify;
pub mod pages;
