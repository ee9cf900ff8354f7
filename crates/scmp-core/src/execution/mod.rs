//! Execution strategies for echo runs.
//!
//! Provides interval-paced and burst scheduling on top of a [`ProbeDriver`].

pub mod burst;
pub mod paced;

pub use burst::run_burst;
pub use paced::run_paced;

use crate::shutdown::ShutdownSignal;
use crate::types::{EchoReply, ProbeEvent, RevocationNotice, Strategy, ValidatedConfig};
use crate::{ProbeDriver, ScmpError};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Parameters shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Number of probes, at most [`MAX_ECHOES`](crate::MAX_ECHOES).
    pub count: u32,
    pub strategy: Strategy,
    /// How long to wait for replies after the last probe.
    pub timeout: Duration,
}

impl RunParams {
    pub fn from_config(config: &ValidatedConfig) -> Self {
        Self {
            count: config.count,
            strategy: config.strategy,
            timeout: config.timeout,
        }
    }
}

/// What a run observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Probes handed to the driver.
    pub sent: u32,
    pub replies: Vec<EchoReply>,
    pub revocations: Vec<RevocationNotice>,
    /// Set when the run stopped on a shutdown request.
    pub interrupted: bool,
}

impl RunReport {
    /// Number of distinct sequence numbers that got a reply.
    pub fn answered(&self) -> usize {
        self.replies.iter().map(|r| r.seq).collect::<HashSet<_>>().len()
    }

    fn record<F: FnMut(&ProbeEvent)>(&mut self, event: ProbeEvent, observer: &mut F) {
        observer(&event);
        match event {
            ProbeEvent::Reply(reply) => {
                debug!(
                    seq = reply.seq,
                    rtt_ms = reply.rtt.as_secs_f64() * 1000.0,
                    "Received echo reply"
                );
                self.replies.push(reply);
            }
            ProbeEvent::Revocation(notice) => {
                warn!(
                    src = %notice.src_ia,
                    if_id = notice.rev_info.if_id,
                    "Received revocation notice"
                );
                self.revocations.push(notice);
            }
        }
    }
}

/// Runs `driver` with the strategy selected in `params`.
///
/// `observer` sees every event as it arrives. Stops early, with
/// [`RunReport::interrupted`] set, once `shutdown` fires.
pub async fn run<D, F>(
    driver: &mut D,
    params: &RunParams,
    shutdown: &mut ShutdownSignal,
    observer: F,
) -> Result<RunReport, ScmpError>
where
    D: ProbeDriver + ?Sized,
    F: FnMut(&ProbeEvent),
{
    match params.strategy {
        Strategy::Paced(interval) => run_paced(driver, params, interval, shutdown, observer).await,
        Strategy::Burst => run_burst(driver, params, shutdown, observer).await,
    }
}

// Sequence numbers wrap like the 16-bit wire field.
fn seq_for(index: u32) -> u16 {
    (index & 0xffff) as u16
}

/// Receives events until `deadline`, until `expected` distinct sequence
/// numbers are answered, or until shutdown. Returns true on shutdown.
async fn receive_until<D, F>(
    driver: &mut D,
    deadline: Instant,
    expected: Option<usize>,
    shutdown: &mut ShutdownSignal,
    report: &mut RunReport,
    observer: &mut F,
) -> Result<bool, ScmpError>
where
    D: ProbeDriver + ?Sized,
    F: FnMut(&ProbeEvent),
{
    loop {
        if expected.is_some_and(|n| report.replies.len() >= n && report.answered() >= n) {
            return Ok(false);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        let received = tokio::select! {
            biased;
            _ = shutdown.requested() => return Ok(true),
            r = driver.receive_probe(deadline - now) => r,
        };

        match received {
            Ok(Some(event)) => report.record(event, observer),
            Ok(None) => continue,
            Err(e) if e.is_retryable() => {
                trace!(error = %e, "Retryable error, continuing");
            }
            Err(e) => {
                debug!(error = %e, "Fatal error during receive");
                return Err(e);
            }
        }
    }
}
