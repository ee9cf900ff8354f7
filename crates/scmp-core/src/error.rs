//! Error types for SCMP probing.

use scmp_proto::{WireError, IA};
use std::net::SocketAddr;
use thiserror::Error;

/// Problems with the user-supplied configuration. These are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid local address: {0}")]
    InvalidLocalAddress(String),

    #[error("Invalid local IA {ia}: {reason}")]
    InvalidLocalIa { ia: String, reason: String },

    #[error("Invalid remote address {addr}: {reason}")]
    InvalidRemoteAddress { addr: String, reason: String },

    #[error("Remote IA {0} must not contain wildcards")]
    WildcardRemote(IA),

    #[error("Echo count {count} exceeds maximum {max}")]
    TooManyEchoes { count: u32, max: u32 },

    #[error("Timeout must be greater than zero")]
    ZeroTimeout,

    #[error("Payload size {size} exceeds maximum {max} for path MTU {mtu}")]
    PayloadTooLarge { size: usize, max: usize, mtu: u16 },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("No path to {0}")]
    NoPath(IA),
}

/// Why a revocation notice could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevocationError {
    #[error("Failed to parse SCMP revocation Info")]
    BadRevocationInfo,

    #[error("Failed to decode SCMP signed revocation Info: {0}")]
    BadSignedRevocation(#[source] WireError),

    #[error("Failed to decode SCMP revocation Info: {0}")]
    BadRevocationRecord(#[source] WireError),
}

/// Main error type for probing operations.
#[derive(Error, Debug)]
pub enum ScmpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Classification errors
    #[error("Not an SCMP header: {l4}")]
    NotDiagnostic { l4: &'static str },

    #[error("Not an SCMP payload: {payload}")]
    NotDiagnosticPayload { payload: &'static str },

    #[error(transparent)]
    Revocation(#[from] RevocationError),

    #[error("Packet did not match probe")]
    PacketMismatch,

    #[error("Malformed packet: {0}")]
    Wire(#[from] WireError),

    // Socket/IO errors
    #[error("Failed to bind to address {addr}: {source}")]
    SocketBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Read timeout exceeded")]
    ReadTimeout,

    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScmpError {
    /// Returns true if the receive loop should keep reading after this error.
    ///
    /// Raw transports deliver whatever arrives on the socket, so foreign,
    /// malformed and undecodable packets are expected and skipped.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ReadTimeout
                | Self::PacketMismatch
                | Self::NotDiagnostic { .. }
                | Self::NotDiagnosticPayload { .. }
                | Self::Revocation(_)
                | Self::Wire(_)
        )
    }
}

impl From<std::io::Error> for ScmpError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => ScmpError::ReadTimeout,
            std::io::ErrorKind::WouldBlock => ScmpError::ReadTimeout,
            _ => ScmpError::Internal(err.to_string()),
        }
    }
}

/// Result type alias for probing operations.
pub type ScmpResult<T> = Result<T, ScmpError>;
