//! Core library for sprout: baby food introduction tracking, recipe
//! favorites, and the progress/achievement engine behind them.

pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod progress;
pub mod service;
