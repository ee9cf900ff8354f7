//! Control-plane messages carried in envelopes.

pub mod cert_mgmt;
pub mod path_mgmt;

pub use cert_mgmt::ChainReq;
pub use path_mgmt::{LinkType, RevInfo, SignedRevInfo, Signature};
