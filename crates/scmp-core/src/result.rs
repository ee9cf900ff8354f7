//! Run summary in ping style and as JSON.

use crate::execution::RunReport;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Round-trip statistics in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    /// Standard deviation.
    pub mdev: f64,
}

impl RttStats {
    /// Returns `None` for an empty sample.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let ms: Vec<f64> = samples.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let n = ms.len() as f64;
        let min = ms.iter().copied().fold(f64::INFINITY, f64::min);
        let max = ms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = ms.iter().sum::<f64>() / n;
        let variance = ms.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n;
        Some(Self {
            min,
            avg,
            max,
            mdev: variance.sqrt(),
        })
    }
}

/// A revocation seen during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevocationSummary {
    /// Sender of the notice, `ISD-AS,[IP]`.
    pub source: String,
    pub isd_as: String,
    pub if_id: u64,
    pub link_type: String,
    pub expires: String,
}

/// Outcome of one echo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Unique identifier for this run.
    pub run_id: String,
    pub source: String,
    pub destination: String,
    pub sent: u64,
    pub received: u64,
    pub packet_loss_percentage: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt: Option<RttStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revocations: Vec<RevocationSummary>,
    pub elapsed_ms: f64,
    pub interrupted: bool,
}

impl Summary {
    /// Combines the session counters with what the run observed.
    pub fn new(session: &Session, report: &RunReport) -> Self {
        let stats = session.stats();
        let rtts: Vec<Duration> = report.replies.iter().map(|r| r.rtt).collect();
        let local = session.local();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            source: format!("{},[{}]", local.ia, local.ip),
            destination: session.remote().to_string(),
            sent: stats.sent,
            received: stats.recv,
            packet_loss_percentage: stats.loss_percentage(),
            rtt: RttStats::from_samples(&rtts),
            revocations: report
                .revocations
                .iter()
                .map(|n| RevocationSummary {
                    source: format!("{},[{}]", n.src_ia, n.src_host),
                    isd_as: n.rev_info.ia().to_string(),
                    if_id: n.rev_info.if_id,
                    link_type: n.rev_info.link_type.to_string(),
                    expires: n.rev_info.expiration().to_rfc3339(),
                })
                .collect(),
            elapsed_ms: session.elapsed().as_secs_f64() * 1000.0,
            interrupted: report.interrupted,
        }
    }

    /// Serializes the summary to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the summary to compact JSON.
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} statistics ---", self.destination)?;
        write!(
            f,
            "{} packets transmitted, {} received, {:.1}% packet loss, time {:.0}ms",
            self.sent, self.received, self.packet_loss_percentage, self.elapsed_ms
        )?;
        if let Some(rtt) = &self.rtt {
            write!(
                f,
                "\nrtt min/avg/max/mdev = {:.3}/{:.3}/{:.3}/{:.3} ms",
                rtt.min, rtt.avg, rtt.max, rtt.mdev
            )?;
        }
        if !self.revocations.is_empty() {
            write!(f, "\n{} revocation(s) received", self.revocations.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rtt: Option<RttStats>) -> Summary {
        Summary {
            run_id: "run".to_string(),
            source: "1-ff00:0:111,[10.0.0.1]".to_string(),
            destination: "1-ff00:0:110,[10.0.0.2]".to_string(),
            sent: 4,
            received: 3,
            packet_loss_percentage: 25.0,
            rtt,
            revocations: vec![],
            elapsed_ms: 3001.4,
            interrupted: false,
        }
    }

    #[test]
    fn test_rtt_stats() {
        assert_eq!(RttStats::from_samples(&[]), None);

        let stats = RttStats::from_samples(&[
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(30),
        ])
        .unwrap();
        assert!((stats.min - 10.0).abs() < 1e-9);
        assert!((stats.avg - 20.0).abs() < 1e-9);
        assert!((stats.max - 30.0).abs() < 1e-9);
        assert!((stats.mdev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_summary_display() {
        let rtt = RttStats {
            min: 1.0,
            avg: 2.0,
            max: 3.0,
            mdev: 0.5,
        };
        let text = summary(Some(rtt)).to_string();
        assert_eq!(
            text,
            "--- 1-ff00:0:110,[10.0.0.2] statistics ---\n\
             4 packets transmitted, 3 received, 25.0% packet loss, time 3001ms\n\
             rtt min/avg/max/mdev = 1.000/2.000/3.000/0.500 ms"
        );

        let text = summary(None).to_string();
        assert!(!text.contains("rtt"));
    }

    #[test]
    fn test_summary_json() {
        let json = summary(None).to_json().unwrap();
        assert!(json.contains("\"packet_loss_percentage\": 25.0"));
        assert!(!json.contains("\"rtt\""));
        assert!(!json.contains("\"revocations\""));

        let parsed: Summary = serde_json::from_str(&summary(None).to_json_compact().unwrap()).unwrap();
        assert_eq!(parsed.received, 3);
    }

    #[test]
    fn test_summary_from_session() {
        use crate::execution::testing::{reply, revocation};
        use crate::session::validate_configuration;
        use crate::types::{PathEntry, ProbeEvent, ScmpConfig, DEFAULT_MTU};
        use scmp_proto::ctrl::LinkType;

        let remote = "1-ff00:0:110,[10.0.0.2]".parse().unwrap();
        let config = ScmpConfig::new("1-ff00:0:111".parse().unwrap(), remote);
        let config = validate_configuration(&config).unwrap();
        let session = Session::new(
            &config,
            "10.0.0.1".parse().unwrap(),
            PathEntry::local(DEFAULT_MTU),
        )
        .unwrap();
        for _ in 0..2 {
            session.record_sent();
        }
        session.record_received();

        let mut report = RunReport::default();
        if let ProbeEvent::Reply(r) = reply(4) {
            report.replies.push(r);
        }
        if let ProbeEvent::Revocation(n) = revocation() {
            report.revocations.push(n);
        }

        let summary = Summary::new(&session, &report);
        assert_eq!(summary.source, "1-ff00:0:111,[10.0.0.1]");
        assert_eq!(summary.destination, "1-ff00:0:110,[10.0.0.2]");
        assert_eq!((summary.sent, summary.received), (2, 1));
        assert_eq!(summary.packet_loss_percentage, 50.0);
        assert!((summary.rtt.unwrap().avg - 5.0).abs() < 1e-9);
        assert_eq!(summary.revocations[0].if_id, 7);
        assert_eq!(summary.revocations[0].isd_as, "1-ff00:0:111");
        assert_eq!(summary.revocations[0].link_type, LinkType::Child.to_string());
        assert!(uuid::Uuid::parse_str(&summary.run_id).is_ok());
    }
}
