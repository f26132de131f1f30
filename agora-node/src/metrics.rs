use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Node-wide Prometheus metrics.
pub struct NodeMetrics {
    pub sequence: Gauge,
    pub total_supply_tokens: Gauge,
    pub campaign_count: Gauge,
    pub proposal_count: Gauge,
    pub nft_count: Gauge,
    pub transitions_accepted: Counter,
    pub transitions_rejected: Counter,
    pub registry: Registry,
}

impl NodeMetrics {
    /// Create a new metrics registry with all node metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let sequence = Gauge::default();
        let total_supply_tokens = Gauge::default();
        let campaign_count = Gauge::default();
        let proposal_count = Gauge::default();
        let nft_count = Gauge::default();
        let transitions_accepted = Counter::default();
        let transitions_rejected = Counter::default();

        registry.register(
            "agora_sequence",
            "Sequence number of the last accepted transition",
            sequence.clone(),
        );
        registry.register(
            "agora_total_supply_tokens",
            "Total token supply in whole tokens",
            total_supply_tokens.clone(),
        );
        registry.register(
            "agora_campaign_count",
            "Number of campaigns ever created",
            campaign_count.clone(),
        );
        registry.register(
            "agora_proposal_count",
            "Number of proposals ever created",
            proposal_count.clone(),
        );
        registry.register(
            "agora_nft_count",
            "Number of NFTs ever minted",
            nft_count.clone(),
        );
        registry.register(
            "agora_transitions_accepted",
            "Total transitions accepted",
            transitions_accepted.clone(),
        );
        registry.register(
            "agora_transitions_rejected",
            "Total transitions rejected",
            transitions_rejected.clone(),
        );

        Self {
            sequence,
            total_supply_tokens,
            campaign_count,
            proposal_count,
            nft_count,
            transitions_accepted,
            transitions_rejected,
            registry,
        }
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        prometheus_client::encoding::text::encode(&mut buf, &self.registry)
            .expect("encoding metrics should not fail");
        buf
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = NodeMetrics::new();
        metrics.sequence.set(42);
        metrics.campaign_count.set(5);
        metrics.transitions_accepted.inc();
        metrics.transitions_accepted.inc();

        let encoded = metrics.encode();
        assert!(encoded.contains("agora_sequence"));
        assert!(encoded.contains("agora_campaign_count"));
        assert!(encoded.contains("agora_transitions_accepted"));
    }

    #[test]
    fn test_metrics_encode_format() {
        let metrics = NodeMetrics::new();
        metrics.sequence.set(100);
        let encoded = metrics.encode();
        // Should contain the metric name and a numeric value.
        assert!(encoded.contains("agora_sequence"));
        assert!(encoded.contains("100"));
    }
}
