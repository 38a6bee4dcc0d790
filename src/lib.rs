//! Caching, paginating front for an employee directory service that can
//! only hand out its whole dataset at once.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod pagination;
pub mod remote;
pub mod repository;
pub mod retry;
pub mod service;
#[cfg(test)]
mod test_support;
