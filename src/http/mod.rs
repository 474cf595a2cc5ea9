//! HTTP host composition.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (layer stack, graceful shutdown)
//!     → request.rs (request ID)
//!     → security / cookies middleware
//!     → handlers.rs (demo app) or fileserver mounts
//!     → error.rs (status → response via ErrorReporter)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::{ErrorReporter, JsonErrorReporter, SharedReporter};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
