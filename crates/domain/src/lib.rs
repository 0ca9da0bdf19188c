#![forbid(unsafe_code)]

pub mod alert;
pub mod attribute;
pub mod common;
pub mod record;
pub mod report;
pub mod task;
