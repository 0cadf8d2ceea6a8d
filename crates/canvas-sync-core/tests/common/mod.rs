//! Shared fixtures for integration tests.
#![allow(dead_code)]

pub mod canvas;
pub mod slow_server;
