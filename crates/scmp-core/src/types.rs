//! Core types for SCMP probing.

use scmp_proto::ctrl::RevInfo;
use scmp_proto::{Path, IA};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Time between two echo requests.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// How long to wait for outstanding replies after the last request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Upper bound on the number of echo requests of a session.
pub const MAX_ECHOES: u32 = 1 << 16;
/// Underlay port of the end-host dispatcher in every AS.
pub const ENDHOST_PORT: u16 = 30041;
/// MTU assumed when the path does not announce one.
pub const DEFAULT_MTU: u16 = 1472;

/// A SCION UDP address: IA, host and optionally the path and first hop
/// used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpAddr {
    pub ia: IA,
    pub host: SocketAddr,
    pub path: Option<Path>,
    /// Underlay address of the first hop, if it is not the host itself.
    pub next_hop: Option<SocketAddr>,
}

impl UdpAddr {
    pub fn new(ia: IA, host: SocketAddr) -> Self {
        Self {
            ia,
            host,
            path: None,
            next_hop: None,
        }
    }
}

impl fmt::Display for UdpAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},[{}]", self.ia, self.host.ip())
    }
}

impl FromStr for UdpAddr {
    type Err = ConfigError;

    /// Parses `ISD-AS,[IP]`, `ISD-AS,[IP]:port` or `ISD-AS,IP`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidRemoteAddress {
            addr: s.to_string(),
            reason,
        };
        let (ia, host) = s
            .split_once(',')
            .ok_or_else(|| invalid("expected ISD-AS,[IP]".to_string()))?;
        let ia: IA = ia.parse().map_err(|e| invalid(format!("{e}")))?;

        let host = if let Ok(addr) = host.parse::<SocketAddr>() {
            addr
        } else {
            let ip = host.trim_start_matches('[').trim_end_matches(']');
            let ip: IpAddr = ip
                .parse()
                .map_err(|_| invalid(format!("bad host {host:?}")))?;
            SocketAddr::new(ip, 0)
        };
        Ok(UdpAddr::new(ia, host))
    }
}

/// A path to the destination as handed out by a path resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub path: Path,
    /// First-hop underlay address; `None` means deliver directly to the host.
    pub next_hop: Option<SocketAddr>,
    pub mtu: u16,
}

impl PathEntry {
    /// The empty path used between hosts of the same AS.
    pub fn local(mtu: u16) -> Self {
        Self {
            path: Path::default(),
            next_hop: None,
            mtu,
        }
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hops: {} MTU: {}", self.path, self.mtu)?;
        if let Some(nh) = self.next_hop {
            write!(f, " NextHop: {}", nh)?;
        }
        Ok(())
    }
}

/// How probes are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One probe per interval, replies collected in between.
    Paced(Duration),
    /// All probes back to back, then collect replies.
    Burst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Paced(interval) => write!(f, "paced({:?})", interval),
            Strategy::Burst => write!(f, "burst"),
        }
    }
}

/// Options of an echo session as given by the user.
#[derive(Debug, Clone)]
pub struct ScmpConfig {
    /// Number of echo requests; 0 means as many as allowed.
    pub count: u32,
    /// Filler bytes appended to every request.
    pub payload_size: usize,
    /// Zero selects burst mode.
    pub interval: Duration,
    pub timeout: Duration,
    /// Let the user pick among several paths.
    pub interactive: bool,
    /// Textual local IP override.
    pub local_ip: Option<String>,
    pub local_ia: IA,
    pub remote: UdpAddr,
}

impl ScmpConfig {
    pub fn new(local_ia: IA, remote: UdpAddr) -> Self {
        Self {
            count: 0,
            payload_size: 0,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            interactive: false,
            local_ip: None,
            local_ia,
            remote,
        }
    }
}

/// Configuration after [`validate_configuration`](crate::validate_configuration).
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub count: u32,
    pub payload_size: usize,
    pub strategy: Strategy,
    pub timeout: Duration,
    pub interactive: bool,
    pub local_ia: IA,
    pub local_ip: Option<IpAddr>,
    pub remote: UdpAddr,
}

/// A matched echo reply.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoReply {
    pub seq: u16,
    pub src_ia: IA,
    pub src_host: IpAddr,
    /// SCMP message length in bytes.
    pub size: usize,
    pub rtt: Duration,
}

impl fmt::Display for EchoReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes from {},[{}] scmp_seq={} time={:.3}ms",
            self.size,
            self.src_ia,
            self.src_host,
            self.seq,
            self.rtt.as_secs_f64() * 1000.0
        )
    }
}

/// A path revocation received on the reply channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RevocationNotice {
    pub src_ia: IA,
    pub src_host: IpAddr,
    pub rev_info: RevInfo,
}

impl fmt::Display for RevocationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Revocation from {},[{}]: {}",
            self.src_ia, self.src_host, self.rev_info
        )
    }
}

/// Something a probe driver received that the run should account for.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    Reply(EchoReply),
    Revocation(RevocationNotice),
}
