//! Credential issuance and verification.
//!
//! Credentials are compact HS256 JWTs carrying the caller's identity and role.
//! Validity depends only on the signature and the embedded expiry: there is no
//! server-side session table and no early revocation.

pub mod jwt;

pub use jwt::{SessionClaims, SessionClaimsBuilder, TokenAuthority, TokenError};
