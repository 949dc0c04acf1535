#![allow(dead_code)]

//! Test fixtures for route-guide.
//!
//! Provides:
//! - A synthetic walking route heading north from Vienna
//! - Scripted routing provider, manual position source and recording speech

pub mod doubles;
pub mod routes;

pub use doubles::*;
pub use routes::*;
