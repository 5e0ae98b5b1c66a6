//! Quality-control gate.
//!
//! The gate is a pure function over the metrics the synthesis service
//! measured. The provider may attach its own decision string to a result;
//! that is ignored so acceptance is decided by one local, testable rule.

use serde::{Deserialize, Serialize};

use revoice_cloneapi::{QcMetrics, QcThresholds};

/// Accept/reject decision for one synthesized result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcDecision {
    Pass,
    Fail,
}

/// Evaluates QC metrics against acceptance thresholds.
///
/// `Pass` iff `wer <= max_wer` and `speaker_cosine >= min_cosine`, both
/// boundaries inclusive. A missing metric is an automatic `Fail`: audio that
/// cannot be verified is never accepted implicitly.
pub fn evaluate(metrics: &QcMetrics, thresholds: &QcThresholds) -> QcDecision {
    let (Some(wer), Some(cosine)) = (metrics.wer, metrics.speaker_cosine) else {
        return QcDecision::Fail;
    };

    if wer <= thresholds.max_wer && cosine >= thresholds.min_cosine {
        QcDecision::Pass
    } else {
        QcDecision::Fail
    }
}
