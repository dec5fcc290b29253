//! Application Layer
//!
//! Use cases and application services.

pub mod accounts;
pub mod config;
pub mod jwt;
pub mod login;
pub mod logout;
pub mod password;
pub mod permissions;
pub mod refresh;
pub mod roles;
pub mod session_context;
pub mod sessions;
pub mod totp;

// Re-exports
pub use accounts::{AccountAdminUseCase, CreateAccountInput, UpdateAccountInput};
pub use config::AuthConfig;
pub use jwt::{Claims, IssuedTokens, JwtManager};
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use logout::{LogoutRoleUseCase, LogoutUseCase};
pub use password::PasswordUseCase;
pub use permissions::{PermissionInput, PermissionUseCase};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use roles::{RoleInput, RolePermissionsOutput, RoleUseCase};
pub use session_context::{SessionContextUseCase, SwitchInput};
pub use sessions::SessionManager;
pub use totp::{TotpGenerateOutput, TotpUseCase};
