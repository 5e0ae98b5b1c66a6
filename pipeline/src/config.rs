//! Run configuration.

use std::time::Duration;

use revoice_cloneapi::{QcThresholds, SynthesisMode};

/// Polling policy for one clone job.
///
/// The deadline of a job is `sum of intervals over max_attempts`, measured
/// from that job's own submission time. With the defaults (1s fixed interval,
/// 40 attempts) a stuck job is abandoned after roughly 40 seconds.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Base delay between status polls.
    pub interval: Duration,
    /// Maximum number of status polls before the job is abandoned locally.
    pub max_attempts: u32,
    /// Multiplier applied to the interval after each attempt; 1.0 keeps the
    /// interval fixed.
    pub backoff_factor: f64,
    /// Upper bound on the backed-off interval.
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 40,
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(10),
        }
    }
}

impl PollPolicy {
    /// Delay to sleep before poll `attempt` (1-based).
    pub fn interval_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let delay = self.interval.mul_f64(factor.max(1.0));
        delay.min(self.max_interval)
    }
}

/// Options for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Polling policy applied to every dispatched job.
    pub poll: PollPolicy,
    /// QC acceptance thresholds applied to every completed result.
    pub thresholds: QcThresholds,
    /// Synthesis delivery mode for submitted jobs.
    pub mode: SynthesisMode,
    /// Maximum request text length per job; longer texts fail that job
    /// before submission.
    pub max_text_length: usize,
    /// Operator recorded consent for replacing voices in this run.
    pub consent: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            thresholds: QcThresholds::default(),
            mode: SynthesisMode::Narration,
            max_text_length: 800,
            consent: true,
        }
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn fixed_interval_by_default() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval_for(1), Duration::from_secs(1));
        assert_eq!(policy.interval_for(40), Duration::from_secs(1));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = PollPolicy {
            interval: Duration::from_secs(1),
            max_attempts: 10,
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(5),
        };
        assert_eq!(policy.interval_for(1), Duration::from_secs(1));
        assert_eq!(policy.interval_for(2), Duration::from_secs(2));
        assert_eq!(policy.interval_for(3), Duration::from_secs(4));
        assert_eq!(policy.interval_for(4), Duration::from_secs(5));
        assert_eq!(policy.interval_for(8), Duration::from_secs(5));
    }
}
