//! SCMP echo probing.

mod driver;
mod packet;

pub use driver::EchoDriver;
pub use packet::{echo_reply, echo_request};
