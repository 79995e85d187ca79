//! Request analytics over other users' requests

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Request, RequestKind, Urgency};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestAnalytics {
    pub total_requests: usize,
    pub by_kind: BTreeMap<RequestKind, usize>,
    pub by_urgency: BTreeMap<Urgency, usize>,
    pub total_amount: f64,
    /// Zero when there are no requests
    pub average_amount: f64,
}

impl RequestAnalytics {
    /// Summarize every request not raised by `exclude_username`
    pub fn collect<'a>(
        requests: impl IntoIterator<Item = &'a Request>,
        exclude_username: &str,
    ) -> Self {
        let mut analytics = Self::default();
        for request in requests
            .into_iter()
            .filter(|request| request.requester != exclude_username)
        {
            analytics.total_requests += 1;
            *analytics.by_kind.entry(request.kind).or_default() += 1;
            *analytics.by_urgency.entry(request.urgency).or_default() += 1;
            analytics.total_amount += request.amount;
        }
        if analytics.total_requests > 0 {
            #[allow(clippy::cast_precision_loss)]
            let count = analytics.total_requests as f64;
            analytics.average_amount = analytics.total_amount / count;
        }
        analytics
    }

    pub fn kind_count(&self, kind: RequestKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn urgency_count(&self, urgency: Urgency) -> usize {
        self.by_urgency.get(&urgency).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;

    #[test]
    fn summarizes_fixture_requests() {
        let fixtures = Fixtures::demo(0);
        let analytics = RequestAnalytics::collect(&fixtures.sample_requests, "demo");

        assert_eq!(analytics.total_requests, 6);
        assert_eq!(analytics.kind_count(RequestKind::Money), 3);
        assert_eq!(analytics.kind_count(RequestKind::Service), 2);
        assert_eq!(analytics.kind_count(RequestKind::Goods), 1);
        assert_eq!(analytics.urgency_count(Urgency::Low), 3);
        assert_eq!(analytics.urgency_count(Urgency::High), 1);
        assert!((analytics.total_amount - 141.0).abs() < 1e-9);
        assert!((analytics.average_amount - 23.5).abs() < 1e-9);
    }

    #[test]
    fn excludes_own_requests_and_handles_empty() {
        let fixtures = Fixtures::demo(0);
        let analytics = RequestAnalytics::collect(&fixtures.sample_requests[..1], "John Doe");
        assert_eq!(analytics, RequestAnalytics::default());
    }

    #[test]
    fn serializes_kind_keys_as_strings() {
        let fixtures = Fixtures::demo(0);
        let analytics = RequestAnalytics::collect(&fixtures.sample_requests, "demo");
        let value = serde_json::to_value(&analytics).unwrap();
        assert_eq!(value["by_kind"]["money"], 3);
        assert_eq!(value["by_urgency"]["medium"], 2);
    }
}
