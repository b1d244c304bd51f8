//! restodb-notify - notification schema migration and validation.
//!
//! Reshapes the restaurant platform's `notifications` table so a
//! notification can be addressed to a customer, an admin or a super-admin,
//! and checks the result end to end.

pub mod config;
pub mod db;
pub mod error;
pub mod harness;
pub mod telemetry;

pub use config::Config;
pub use db::Database;
pub use error::{DbError, HarnessError};
