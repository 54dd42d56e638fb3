//! BookBazar storefront library.
//!
//! The web application as a library, so the binary, the CLI and tests share
//! the same repositories, forms and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
