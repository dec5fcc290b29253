//! Value Object Module

pub mod account_status;
pub mod action;
pub mod email;
pub mod role_type;
pub mod totp_secret;
