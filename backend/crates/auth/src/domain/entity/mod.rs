//! Entity Module

pub mod account;
pub mod permission;
pub mod role;
pub mod session;
pub mod token;
