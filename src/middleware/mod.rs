pub mod auth;
pub mod response;
pub mod role;

pub use auth::{jwt_auth_middleware, optional_identity, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use role::{require_roles, ADMIN_ONLY};
