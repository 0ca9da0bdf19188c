use ports::secondary::metrics_port::{AttributeMetrics, DispatchMetrics, ReportMetrics};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use crate::constants::METRICS_PREFIX;

// ── Label types ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusLabels {
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct KindLabels {
    pub kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct AttrTypeLabels {
    pub attr_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TaskLabels {
    pub author: String,
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RoleLabels {
    pub role: String,
}

// ── Agent metrics registry ──────────────────────────────────────────

/// Prometheus metrics registry for the agent.
///
/// All metric families use interior mutability (atomics), so recording
/// metrics only requires `&self`. Wrap in `Arc` to share between services.
pub struct AgentMetrics {
    registry: Registry,
    pub reports_total: Family<StatusLabels, Counter>,
    pub staged_records_total: Family<KindLabels, Counter>,
    pub attributes_cached_total: Family<AttrTypeLabels, Counter>,
    pub attribute_duplicates_total: Family<AttrTypeLabels, Counter>,
    pub tasks_total: Family<TaskLabels, Counter>,
    pub messages_published_total: Family<RoleLabels, Counter>,
    pub publish_failures_total: Family<RoleLabels, Counter>,
}

impl AgentMetrics {
    /// Create a new metrics registry with all metrics registered under
    /// the `deepinspect` prefix.
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix(METRICS_PREFIX);

        let reports_total = Family::<StatusLabels, Counter>::default();
        registry.register(
            "reports",
            "Alert correlations by outcome (new or more)",
            reports_total.clone(),
        );

        let staged_records_total = Family::<KindLabels, Counter>::default();
        registry.register(
            "staged_records",
            "Rows appended to the staging log by kind",
            staged_records_total.clone(),
        );

        let attributes_cached_total = Family::<AttrTypeLabels, Counter>::default();
        registry.register(
            "attributes_cached",
            "Attributes accepted by the dedup cache",
            attributes_cached_total.clone(),
        );

        let attribute_duplicates_total = Family::<AttrTypeLabels, Counter>::default();
        registry.register(
            "attribute_duplicates",
            "Attributes skipped because they were already scheduled",
            attribute_duplicates_total.clone(),
        );

        let tasks_total = Family::<TaskLabels, Counter>::default();
        registry.register(
            "tasks",
            "Inspector invocations by author and outcome",
            tasks_total.clone(),
        );

        let messages_published_total = Family::<RoleLabels, Counter>::default();
        registry.register(
            "messages_published",
            "Messages published by queue role",
            messages_published_total.clone(),
        );

        let publish_failures_total = Family::<RoleLabels, Counter>::default();
        registry.register(
            "publish_failures",
            "Failed publishes by queue role",
            publish_failures_total.clone(),
        );

        Self {
            registry,
            reports_total,
            staged_records_total,
            attributes_cached_total,
            attribute_duplicates_total,
            tasks_total,
            messages_published_total,
            publish_failures_total,
        }
    }

    /// Encode all metrics in OpenMetrics text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        buffer
    }
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sub-trait implementations ──────────────────────────────────────

impl ReportMetrics for AgentMetrics {
    fn record_report(&self, status: &str) {
        self.reports_total
            .get_or_create(&StatusLabels {
                status: status.to_string(),
            })
            .inc();
    }

    fn record_staged(&self, kind: &str) {
        self.staged_records_total
            .get_or_create(&KindLabels {
                kind: kind.to_string(),
            })
            .inc();
    }
}

impl AttributeMetrics for AgentMetrics {
    fn record_attribute_cached(&self, attr_type: &str) {
        self.attributes_cached_total
            .get_or_create(&AttrTypeLabels {
                attr_type: attr_type.to_string(),
            })
            .inc();
    }

    fn record_attribute_duplicate(&self, attr_type: &str) {
        self.attribute_duplicates_total
            .get_or_create(&AttrTypeLabels {
                attr_type: attr_type.to_string(),
            })
            .inc();
    }
}

impl DispatchMetrics for AgentMetrics {
    fn record_task(&self, author: &str, outcome: &str) {
        self.tasks_total
            .get_or_create(&TaskLabels {
                author: author.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
    }

    fn record_published(&self, role: &str) {
        self.messages_published_total
            .get_or_create(&RoleLabels {
                role: role.to_string(),
            })
            .inc();
    }

    fn record_publish_failure(&self, role: &str) {
        self.publish_failures_total
            .get_or_create(&RoleLabels {
                role: role.to_string(),
            })
            .inc();
    }
}

// MetricsPort is automatically implemented via the blanket impl
// since AgentMetrics implements all sub-traits.
