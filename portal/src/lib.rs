//! NUHS teacher portal library
//!
//! This library exposes the core functionality of the portal for the
//! command-line front end and for integration tests.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
