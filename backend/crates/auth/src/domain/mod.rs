//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

pub use entity::{
    account::Account, permission::Permission, role::Role, session::Session, token::Token,
};
pub use repository::{
    AccountRepository, PermissionRepository, RoleRepository, SessionRepository, TokenRepository,
};
