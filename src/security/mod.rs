//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → nonce.rs (16 random bytes → 22 char nonce)
//!     → csp.rs (render Content-Security-Policy with the nonce)
//!     → context.rs (nonce stored in request extensions)
//!     → handler renders <script nonce="...">
//!     → middleware.rs writes the CSP header on the way out
//!
//! Every response:
//!     → headers.rs (X-Frame-Options, HSTS, ... and CORS)
//! ```
//!
//! # Design Decisions
//! - Fail closed: no entropy, no response
//! - One nonce per request, shared by header and markup
//! - No trust in client input

pub mod context;
pub mod csp;
pub mod headers;
pub mod middleware;
pub mod nonce;

pub use context::{get_nonce, SecurityContext};
pub use csp::{build_csp, CspConfig};
pub use middleware::{csp_nonce_middleware, CspState};
pub use nonce::{Nonce, NonceGenerator, NONCE_LEN};
