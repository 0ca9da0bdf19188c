pub mod inspector_port;
pub mod metrics_port;
pub mod record_store;
pub mod task_queue;
