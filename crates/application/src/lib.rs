#![forbid(unsafe_code)]

mod codec;

pub mod alert_intake;
pub mod dispatch;
pub mod feedback;
pub mod inspector_runtime;
pub mod repository_service;
