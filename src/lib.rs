//! Mandi Prices Library
//!
//! AGMARKNET commodity prices: a secrets-holding proxy in front of the
//! data.gov.in API, and a cached, filterable terminal dashboard on top of it.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod i18n;
pub mod market;
pub mod proxy;
pub mod ui;
