pub mod identity;
pub mod password;
pub mod session;
pub mod token;

pub use identity::AuthProof;
pub use session::SessionManager;
pub use token::{Claims, TokenError, TokenIssuer};
