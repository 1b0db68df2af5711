//! Authentication Layer
//!
//! Validates gateway-issued tokens and resolves the caller's role
//! records. Login, registration and token issuance live in the fronting
//! gateway, not here.

mod error;
pub mod jwt;
mod middleware;
mod scope;

pub use error::{AuthError, AuthResult};
pub use middleware::{
    require_administrator, require_auth, require_grantee, require_manager, AdminContext,
    AuthCitizen, GranteeContext, ManagerContext,
};
pub use scope::{
    ensure_association_authority, ensure_department_authority, ensure_scope_authority,
    ensure_service_authority, ActorKind, ActorScope,
};
