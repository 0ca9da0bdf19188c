#![deny(unsafe_code)]

pub mod queue;
pub mod storage;
