/// Authentication and authorization.
///
/// Credential handling, signed-token issuance and validation with
/// revocation support, role-gated access decisions, and the
/// email-verification / password-reset flows.

mod claims;
mod guard;
mod jwt;
mod manager;
mod password;
mod revocation;

pub use claims::{TokenClaims, TokenType};
pub use guard::{AccessGuard, RoleSet};
pub use jwt::TokenCodec;
pub use manager::{AuthManager, SignupFields, TokenPair};
pub use password::{hash_password, verify_password};
pub use revocation::{InMemoryRevocationStore, RevocationStore};
