//! Queue worker pool for the Jobs domain

pub mod worker;

pub use worker::QueueWorker;
