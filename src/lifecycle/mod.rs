//! Process lifecycle.
//!
//! ```text
//! startup.rs   config → logging/metrics → bind listener
//! signals.rs   SIGINT / SIGTERM
//! shutdown.rs  broadcast → servers stop accepting, drain, gateway saves its cache
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
