//! SCMP: the diagnostic and error protocol of the path-aware network.
//!
//! An SCMP message is a fixed [`Hdr`] followed by a [`Payload`] made of a
//! [`Meta`] block, a class-specific [`Info`] block, quoted headers of the
//! offending packet and free-form data. All lengths inside [`Meta`] count
//! [`LINE_LEN`]-byte lines.

pub mod hdr;
pub mod info;
pub mod meta;
pub mod payload;

pub use hdr::{Class, ClassType, GeneralType, Hdr, PathType};
pub use info::{Info, InfoEcho, InfoRevocation, InfoTraceRoute};
pub use meta::Meta;
pub use payload::Payload;

/// Unit in which SCMP lengths are expressed.
pub const LINE_LEN: usize = 8;
/// Length of the SCMP header.
pub const HDR_LEN: usize = 16;
/// Length of the meta block.
pub const META_LEN: usize = 8;
