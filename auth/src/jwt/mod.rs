pub mod claims;
pub mod errors;
pub mod issuer;

pub use claims::AccessClaims;
pub use claims::AccessSubject;
pub use claims::RefreshClaims;
pub use errors::TokenError;
pub use issuer::TokenConfig;
pub use issuer::TokenIssuer;
