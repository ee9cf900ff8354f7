//! Core of the SCMP diagnostic tool.
//!
//! This crate provides the protocol-independent parts of a probing run:
//!
//! - [`build_probe`] to assemble diagnostic request packets
//! - [`classify`] to sort incoming packets into replies and revocations
//! - [`Session`] for per-run state and counters
//! - [`ShutdownCoordinator`] for signal-driven cleanup
//! - [`Transport`], [`PathResolver`] and [`ProbeDriver`] seams
//! - Execution strategies and the run [`Summary`]

pub mod classify;
pub mod error;
pub mod execution;
pub mod probe;
pub mod result;
pub mod session;
pub mod shutdown;
pub mod traits;
pub mod types;

pub use classify::{classify, Classification};
pub use error::{ConfigError, RevocationError, ScmpError, ScmpResult};
pub use execution::{RunParams, RunReport};
pub use probe::{build_probe, stamp, Probe};
pub use result::{RevocationSummary, RttStats, Summary};
pub use session::{validate_configuration, LocalEndpoint, Session, Stats, StatsSnapshot};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use traits::{PathResolver, ProbeDriver, Transport};
pub use types::{
    EchoReply, PathEntry, ProbeEvent, RevocationNotice, ScmpConfig, Strategy, UdpAddr,
    ValidatedConfig, DEFAULT_INTERVAL, DEFAULT_MTU, DEFAULT_TIMEOUT, ENDHOST_PORT, MAX_ECHOES,
};
