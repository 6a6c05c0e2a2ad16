use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Lifecycle counters:
// - order / delivery status transitions (by target status)
// - delivery claim outcomes (won / lost)
// - optimistic-concurrency conflicts (by record kind)
// - review submissions and seller responses
// - media upload failures
//
// All metrics live in one registry, rendered at /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub order_transitions: IntCounterVec,
    pub delivery_transitions: IntCounterVec,
    pub delivery_claims: IntCounterVec,
    pub store_conflicts: IntCounterVec,
    pub reviews: IntCounterVec,
    pub upload_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions by target status"),
            &["to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let delivery_transitions = IntCounterVec::new(
            Opts::new("delivery_transitions_total", "Delivery status transitions by target status"),
            &["to"],
        )?;
        registry.register(Box::new(delivery_transitions.clone()))?;

        let delivery_claims = IntCounterVec::new(
            Opts::new("delivery_claims_total", "Delivery assignment attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(delivery_claims.clone()))?;

        let store_conflicts = IntCounterVec::new(
            Opts::new("store_conflicts_total", "Version conflicts on conditional updates"),
            &["kind"],
        )?;
        registry.register(Box::new(store_conflicts.clone()))?;

        let reviews = IntCounterVec::new(
            Opts::new("review_actions_total", "Review submissions, publications and seller responses"),
            &["action"],
        )?;
        registry.register(Box::new(reviews.clone()))?;

        let upload_failures = IntCounter::new(
            "media_upload_failures_total",
            "Logo uploads that failed and were skipped",
        )?;
        registry.register(Box::new(upload_failures.clone()))?;

        Ok(Self {
            registry,
            order_transitions,
            delivery_transitions,
            delivery_claims,
            store_conflicts,
            reviews,
            upload_failures,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_transition(&self, to: &str) {
        self.order_transitions.with_label_values(&[to]).inc();
    }

    pub fn record_delivery_transition(&self, to: &str) {
        self.delivery_transitions.with_label_values(&[to]).inc();
    }

    pub fn record_claim(&self, won: bool) {
        let outcome = if won { "won" } else { "lost" };
        self.delivery_claims.with_label_values(&[outcome]).inc();
    }

    pub fn record_conflict(&self, kind: &str) {
        self.store_conflicts.with_label_values(&[kind]).inc();
    }

    pub fn record_review_action(&self, action: &str) {
        self.reviews.with_label_values(&[action]).inc();
    }

    pub fn record_upload_failure(&self) {
        self.upload_failures.inc();
    }

    /// Text exposition format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_conflict("orders");
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_claims() {
        let metrics = Metrics::new().unwrap();
        metrics.record_claim(true);
        metrics.record_claim(false);
        metrics.record_claim(false);

        let gathered = metrics.registry().gather();
        let claims = gathered.iter().find(|m| m.name() == "delivery_claims_total").unwrap();
        assert_eq!(claims.metric.len(), 2);
    }

    #[test]
    fn test_render_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_transition("shipped");
        metrics.record_upload_failure();

        let text = metrics.render().unwrap();
        assert!(text.contains("order_transitions_total{to=\"shipped\"} 1"));
        assert!(text.contains("media_upload_failures_total 1"));
    }
}
