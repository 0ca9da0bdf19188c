// Focused sub-traits for recording Prometheus metrics, grouped by concern.
//
// All methods take `&self` because the underlying implementation uses
// atomic operations (interior mutability via `prometheus-client`).
//
// Default implementations are no-ops, allowing test mocks to implement
// only the sub-traits relevant to the service under test.

// ── Report correlation metrics ─────────────────────────────────────

pub trait ReportMetrics: Send + Sync {
    /// Record the outcome of a correlation call (`new` or `more`).
    fn record_report(&self, _status: &str) {}

    /// Record a staged row by kind (`alert_cache`, `report_section`).
    fn record_staged(&self, _kind: &str) {}
}

// ── Attribute dedup metrics ────────────────────────────────────────

pub trait AttributeMetrics: Send + Sync {
    /// Record an attribute accepted by the dedup cache.
    fn record_attribute_cached(&self, _attr_type: &str) {}

    /// Record an attribute skipped because it was already scheduled.
    fn record_attribute_duplicate(&self, _attr_type: &str) {}
}

// ── Task dispatch metrics ──────────────────────────────────────────

pub trait DispatchMetrics: Send + Sync {
    /// Record an inspector invocation outcome (`published`, `empty`,
    /// `declined` or `failed`).
    fn record_task(&self, _author: &str, _outcome: &str) {}

    /// Record a message published to a queue role.
    fn record_published(&self, _role: &str) {}

    /// Record a publish failure for a queue role.
    fn record_publish_failure(&self, _role: &str) {}
}

/// Composite metrics port combining all sub-traits.
///
/// Services accept `Arc<dyn MetricsPort>` for full access. The sub-traits
/// provide default no-op implementations so that test mocks only need to
/// override the methods they care about.
pub trait MetricsPort: ReportMetrics + AttributeMetrics + DispatchMetrics {}

/// Blanket implementation: any type implementing all sub-traits
/// implements `MetricsPort`.
impl<T> MetricsPort for T where T: ReportMetrics + AttributeMetrics + DispatchMetrics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_port_is_object_safe() {
        // Compile-time check: MetricsPort must be usable as dyn trait.
        fn _check(port: &dyn MetricsPort) {
            port.record_report("new");
            port.record_staged("alert_cache");
            port.record_attribute_cached("ipaddr");
            port.record_attribute_duplicate("ipaddr");
            port.record_task("inspector", "published");
            port.record_published("content");
            port.record_publish_failure("attribute");
        }
    }
}
