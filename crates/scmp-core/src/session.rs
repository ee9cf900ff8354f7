//! Per-run session state shared by the send loop, the receive loop and the
//! shutdown handler.

use scmp_proto::scmp::{GeneralType, Info, InfoEcho};
use scmp_proto::{Path, IA};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::ConfigError;
use crate::probe::build_probe;
use crate::types::{
    PathEntry, ScmpConfig, Strategy, UdpAddr, ValidatedConfig, ENDHOST_PORT, MAX_ECHOES,
};

/// Sent/received counters. Increments are atomic and never undone, so
/// readers on other tasks see a best-effort, monotonic view.
#[derive(Debug, Default)]
pub struct Stats {
    sent: AtomicU64,
    recv: AtomicU64,
}

impl Stats {
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.recv.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            recv: self.recv.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub recv: u64,
}

impl StatsSnapshot {
    /// Percentage of requests without reply. Late or duplicate replies can
    /// push `recv` past `sent`; loss never goes below zero.
    pub fn loss_percentage(&self) -> f32 {
        if self.sent == 0 {
            return 0.0;
        }
        let lost = self.sent.saturating_sub(self.recv);
        (lost as f64 * 100.0 / self.sent as f64) as f32
    }
}

/// Local end of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalEndpoint {
    pub ia: IA,
    pub ip: IpAddr,
}

/// State of one diagnostic session.
#[derive(Debug)]
pub struct Session {
    local: LocalEndpoint,
    remote: UdpAddr,
    mtu: u16,
    payload_size: usize,
    stats: Stats,
    start: Instant,
}

impl Session {
    /// Creates a session towards `config.remote` over `path`.
    ///
    /// Fails if an echo request with the configured payload would not fit
    /// the path MTU.
    pub fn new(
        config: &ValidatedConfig,
        local_ip: IpAddr,
        path: PathEntry,
    ) -> Result<Self, ConfigError> {
        let mut remote = config.remote.clone();
        remote.path = (!path.path.is_empty()).then_some(path.path);
        if path.next_hop.is_some() {
            remote.next_hop = path.next_hop;
        }

        let session = Self {
            local: LocalEndpoint {
                ia: config.local_ia,
                ip: local_ip,
            },
            remote,
            mtu: path.mtu,
            payload_size: config.payload_size,
            stats: Stats::default(),
            start: Instant::now(),
        };
        session.check_mtu()?;
        Ok(session)
    }

    fn check_mtu(&self) -> Result<(), ConfigError> {
        let info = Info::Echo(InfoEcho { id: 0, seq: 0 });
        let probe = build_probe(self, GeneralType::EchoRequest, info, None)
            .map_err(|e| ConfigError::InvalidPath(e.to_string()))?;
        let len = probe.pkt.encoded_len();
        if len > usize::from(self.mtu) {
            let overhead = len - self.payload_size;
            return Err(ConfigError::PayloadTooLarge {
                size: self.payload_size,
                max: usize::from(self.mtu).saturating_sub(overhead),
                mtu: self.mtu,
            });
        }
        Ok(())
    }

    pub fn local(&self) -> &LocalEndpoint {
        &self.local
    }

    pub fn remote(&self) -> &UdpAddr {
        &self.remote
    }

    pub fn path(&self) -> Option<&Path> {
        self.remote.path.as_ref()
    }

    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn record_sent(&self) {
        self.stats.record_sent();
    }

    pub fn record_received(&self) {
        self.stats.record_received();
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The underlay address packets are first sent to: the configured next
    /// hop, or the remote host's dispatcher.
    pub fn derive_next_hop(&self) -> SocketAddr {
        self.remote
            .next_hop
            .unwrap_or_else(|| SocketAddr::new(self.remote.host.ip(), ENDHOST_PORT))
    }
}

/// Checks and normalises user options.
///
/// Invalid options are reported to the caller, which decides how to exit.
pub fn validate_configuration(config: &ScmpConfig) -> Result<ValidatedConfig, ConfigError> {
    let local_ip = match config.local_ip.as_deref() {
        Some(s) if !s.is_empty() => Some(
            s.parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidLocalAddress(s.to_string()))?,
        ),
        _ => None,
    };
    if config.remote.ia.is_wildcard() {
        return Err(ConfigError::WildcardRemote(config.remote.ia));
    }
    let count = match config.count {
        0 => MAX_ECHOES,
        n if n > MAX_ECHOES => {
            return Err(ConfigError::TooManyEchoes {
                count: n,
                max: MAX_ECHOES,
            })
        }
        n => n,
    };
    if config.timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout);
    }
    let strategy = if config.interval.is_zero() {
        Strategy::Burst
    } else {
        Strategy::Paced(config.interval)
    };

    Ok(ValidatedConfig {
        count,
        payload_size: config.payload_size,
        strategy,
        timeout: config.timeout,
        interactive: config.interactive,
        local_ia: config.local_ia,
        local_ip,
        remote: config.remote.clone(),
    })
}
