//! # Cohort
//!
//! Command-line tool and HTTP server around `cohort-core`: reads rosters
//! from JSON or spreadsheets, groups every population and reports the
//! result as text or JSON.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod roster_io;
pub mod service;
pub mod template;
