//! Interval-paced execution.
//!
//! Sends one probe per interval and collects replies in between. After the
//! last probe, waits up to the timeout for outstanding replies.

use super::{receive_until, seq_for, RunParams, RunReport};
use crate::shutdown::ShutdownSignal;
use crate::types::ProbeEvent;
use crate::{ProbeDriver, ScmpError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

pub async fn run_paced<D, F>(
    driver: &mut D,
    params: &RunParams,
    interval: Duration,
    shutdown: &mut ShutdownSignal,
    mut observer: F,
) -> Result<RunReport, ScmpError>
where
    D: ProbeDriver + ?Sized,
    F: FnMut(&ProbeEvent),
{
    let mut report = RunReport::default();

    for index in 0..params.count {
        if shutdown.is_requested() {
            report.interrupted = true;
            break;
        }

        let seq = seq_for(index);
        let next_tick = Instant::now() + interval;
        debug!(seq = seq, "Sending echo request");
        driver.send_probe(seq).await?;
        report.sent += 1;

        let last = index + 1 == params.count;
        let (deadline, expected) = if last {
            (Instant::now() + params.timeout, Some(params.count as usize))
        } else {
            (next_tick, None)
        };

        if receive_until(driver, deadline, expected, shutdown, &mut report, &mut observer).await? {
            report.interrupted = true;
            break;
        }
    }

    if report.interrupted {
        info!(sent = report.sent, "Run interrupted");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{never_shutdown, ScriptedDriver};
    use super::*;
    use crate::types::Strategy;
    use crate::ShutdownCoordinator;

    fn params(count: u32, interval: Duration) -> RunParams {
        RunParams {
            count,
            strategy: Strategy::Paced(interval),
            timeout: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_paced_sends_every_probe_in_order() {
        let mut shutdown = never_shutdown();
        let mut driver = ScriptedDriver::default();
        driver.drop.insert(1);

        let interval = Duration::from_millis(10);
        let start = Instant::now();
        let report = run_paced(&mut driver, &params(4, interval), interval, &mut shutdown, |_| {})
            .await
            .unwrap();

        assert_eq!(driver.sent, vec![0, 1, 2, 3]);
        assert_eq!(report.sent, 4);
        let seqs: Vec<u16> = report.replies.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 2, 3]);
        // Three full intervals plus the straggler timeout for the lost probe.
        assert!(start.elapsed() >= interval * 3);
    }

    #[tokio::test]
    async fn test_paced_stops_on_shutdown() {
        let mut shutdown = ShutdownCoordinator::install_with(
            async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(())
            },
            || {},
        );
        let mut driver = ScriptedDriver::default();
        let interval = Duration::from_millis(20);

        let report = run_paced(&mut driver, &params(1000, interval), interval, &mut shutdown, |_| {})
            .await
            .unwrap();

        assert!(report.interrupted);
        assert!(report.sent < 1000);
        assert_eq!(report.sent as usize, driver.sent.len());
    }

    #[tokio::test]
    async fn test_paced_send_failure_is_fatal() {
        let mut shutdown = never_shutdown();
        let mut driver = ScriptedDriver {
            fail_send_at: Some(2),
            ..Default::default()
        };
        let interval = Duration::from_millis(1);

        let err = run_paced(&mut driver, &params(5, interval), interval, &mut shutdown, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ScmpError::WriteFailed(_)));
        assert_eq!(driver.sent, vec![0, 1]);
    }
}
