//! Per-request outcomes of a batch
//!
//! Every input index ends with exactly one `Outcome`: the matched response
//! or a terminal failure after the attempts ran out.

use http::Method;

use super::response::PipelineResponse;
use crate::error::{Error, Kind};
use crate::telemetry::PipelineStatsSnapshot;

/// Terminal failure of one request.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: Kind,
    /// Attempts made before giving up (0 when the batch was cut short
    /// before this request was ever written)
    pub attempts: u32,
    pub method: Method,
    pub target: String,
    /// The last error observed
    pub error: Error,
}

/// Final state of one request.
#[derive(Debug, Clone)]
pub enum Outcome {
    Matched {
        response: PipelineResponse,
        attempts: u32,
    },
    Failed(Failure),
}

impl Outcome {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched { .. })
    }

    #[must_use]
    pub fn response(&self) -> Option<&PipelineResponse> {
        match self {
            Outcome::Matched { response, .. } => Some(response),
            Outcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Matched { .. } => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    /// Attempts this request took, successful or not.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Outcome::Matched { attempts, .. } => *attempts,
            Outcome::Failed(failure) => failure.attempts,
        }
    }
}

/// Outcomes indexed by batch position, plus session counters.
#[derive(Debug, Clone)]
pub struct BatchResult {
    outcomes: Vec<Outcome>,
    stats: PipelineStatsSnapshot,
}

impl BatchResult {
    pub(crate) fn new(outcomes: Vec<Outcome>, stats: PipelineStatsSnapshot) -> Self {
        Self { outcomes, stats }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Outcome> {
        self.outcomes.get(index)
    }

    /// `(index, outcome)` pairs in batch order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Outcome)> {
        self.outcomes.iter().enumerate()
    }

    pub fn responses(&self) -> impl Iterator<Item = (usize, &PipelineResponse)> {
        self.iter()
            .filter_map(|(index, outcome)| outcome.response().map(|r| (index, r)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &Failure)> {
        self.iter()
            .filter_map(|(index, outcome)| outcome.failure().map(|f| (index, f)))
    }

    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_matched()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.matched_count()
    }

    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_matched)
    }

    #[must_use]
    pub fn stats(&self) -> &PipelineStatsSnapshot {
        &self.stats
    }

    #[must_use]
    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }
}

impl IntoIterator for BatchResult {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode, Version};

    fn ok() -> Outcome {
        Outcome::Matched {
            response: PipelineResponse {
                status: StatusCode::OK,
                reason: "OK".to_string(),
                version: Version::HTTP_11,
                headers: HeaderMap::new(),
                body: Bytes::new(),
            },
            attempts: 1,
        }
    }

    fn failed() -> Outcome {
        Outcome::Failed(Failure {
            kind: Kind::Timeout,
            attempts: 3,
            method: Method::HEAD,
            target: "/slow".to_string(),
            error: error::timed_out(),
        })
    }

    #[test]
    fn counts_and_views() {
        let result = BatchResult::new(
            vec![ok(), failed(), ok()],
            PipelineStatsSnapshot::default(),
        );
        assert_eq!(result.len(), 3);
        assert_eq!(result.matched_count(), 2);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.all_matched());

        let failures: Vec<usize> = result.failures().map(|(i, _)| i).collect();
        assert_eq!(failures, vec![1]);
        let failure = result.get(1).and_then(Outcome::failure).unwrap();
        assert_eq!(failure.target, "/slow");
        assert_eq!(result.get(1).unwrap().attempts(), 3);
        assert_eq!(result.responses().count(), 2);
    }
}
