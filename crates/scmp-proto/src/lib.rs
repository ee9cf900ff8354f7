//! Wire types for the SCMP diagnostic tool.
//!
//! This crate provides everything that has a byte representation:
//!
//! - [`IA`] addressing
//! - the self-describing message [`envelope`] and the control messages
//!   carried in it ([`ctrl`])
//! - [`scmp`] headers and payloads
//! - hop-by-hop [`Extension`]s and the [`ScnPkt`] packet model

pub mod addr;
pub mod codec;
pub mod ctrl;
pub mod envelope;
pub mod error;
pub mod extn;
pub mod scmp;
pub mod spkt;

pub use addr::{IAInt, IA};
pub use envelope::{ProtoId, WireMessage};
pub use error::{WireError, WireResult};
pub use extn::{Extension, ExtnScmp};
pub use spkt::{L4Header, L4Payload, Path, ScnPkt, UdpHdr};
