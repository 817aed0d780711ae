//! Token lifecycle: issuance, verification and revocation of signed bearer tokens.

pub mod clock;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use token::{AuthError, Claims, Identity, TokenManager, DEFAULT_TOKEN_TTL_SECS};
