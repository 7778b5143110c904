//! Turnos kiosk library crate
//!
//! The session controller lives in `kiosk` and performs no I/O. `api`,
//! `branch` and `config` are the host services it is wired to, and `app` plus
//! `ui` form the terminal front end.

pub mod api;
pub mod app;
pub mod branch;
pub mod config;
pub mod error;
pub mod kiosk;
pub mod models;
pub mod ui;
pub mod util;
