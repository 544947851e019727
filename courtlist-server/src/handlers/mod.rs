//! HTTP request handlers organized by functionality

pub mod court_lists;
pub mod health;
