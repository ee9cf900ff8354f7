//! Burst execution.
//!
//! Sends all probes back to back, then collects replies until every probe
//! is answered or the timeout passes.

use super::{receive_until, seq_for, RunParams, RunReport};
use crate::shutdown::ShutdownSignal;
use crate::types::ProbeEvent;
use crate::{ProbeDriver, ScmpError};
use tokio::time::Instant;
use tracing::{debug, info};

pub async fn run_burst<D, F>(
    driver: &mut D,
    params: &RunParams,
    shutdown: &mut ShutdownSignal,
    mut observer: F,
) -> Result<RunReport, ScmpError>
where
    D: ProbeDriver + ?Sized,
    F: FnMut(&ProbeEvent),
{
    let mut report = RunReport::default();

    debug!(count = params.count, "Sending all probes");
    for index in 0..params.count {
        if shutdown.is_requested() {
            report.interrupted = true;
            info!(sent = report.sent, "Run interrupted");
            return Ok(report);
        }
        driver.send_probe(seq_for(index)).await?;
        report.sent += 1;
    }

    debug!("Receiving responses");
    let deadline = Instant::now() + params.timeout;
    let expected = Some(params.count as usize);
    if receive_until(driver, deadline, expected, shutdown, &mut report, &mut observer).await? {
        report.interrupted = true;
        info!(sent = report.sent, "Run interrupted");
    }
    Ok(report)
}
