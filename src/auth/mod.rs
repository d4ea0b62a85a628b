//! Bearer-token verification. Tokens are issued by the session service;
//! this crate only checks them and extracts the user ID.

mod claims;
pub mod jwt;

pub use claims::{Claims, TokenKind};
pub use jwt::{AuthUser, JwtKeys};
