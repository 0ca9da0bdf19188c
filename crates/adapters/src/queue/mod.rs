pub mod http_queue;
pub mod log_queue;
