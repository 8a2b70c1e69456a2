//! netcall server-side core.
//!
//! The networking and automation engine behind the RPC surface:
//!
//! - QUIC server endpoint (accepts secure channels via quinn)
//! - Method dispatcher for the four-call protocol
//! - Device session manager (single-use SSH command sessions)
//! - Inventory batch gateway (task executor extension seam)

pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod service;
pub mod session;
pub mod stream_io;

pub use endpoint::ServerEndpoint;
pub use error::ServerError;
pub use service::AutomationService;
