//! Admin panel core for broadcasting a newsletter to every subscriber.
//!
//! Two components do the actual work:
//!
//! - [`auth`] verifies operator credentials and issues encrypted session
//!   tokens guarding the protected routes,
//! - [`email::broadcast`] delivers a subject/body pair to each subscriber over
//!   an authenticated SMTP session and tallies the results.
//!
//! Everything else (storage, config, tracing, the web surface) exists to wire
//! those two together.

#[macro_use]
extern crate serde_derive;

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod init;
pub mod routes;
pub mod tracing;

#[cfg(feature = "axum")]
pub mod axum;

pub use config::Config;
pub use db::Database;
pub use email::broadcast::{Broadcast, Dispatcher, Report, Status};
pub use error::{Error, ErrorKind, Result};
