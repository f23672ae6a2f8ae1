//! Database models split into domain-specific modules.

pub mod common;
pub mod employee;
pub mod timesheet;

pub use common::*;
pub use employee::*;
pub use timesheet::*;
