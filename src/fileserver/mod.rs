//! Hardened static file serving.
//!
//! # Data Flow
//! ```text
//! GET /static/a/b.css
//!     → SafeFileResolver (normalize, join root/prefix, canonicalize, stat)
//!     → regular file: ServeFile + CachePolicy
//!     → directory / escape: 403, missing: 404, other I/O: 500
//! ```

pub mod cache;
pub mod mount;
pub mod resolver;

pub use cache::CachePolicy;
pub use mount::mount_router;
pub use resolver::SafeFileResolver;
