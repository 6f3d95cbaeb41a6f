//! Application services - Cross-cutting helpers for handlers

pub mod flood;
pub mod session;

pub use flood::with_flood_retry;
pub use session::SessionStore;
