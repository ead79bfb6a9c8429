//! Review-acquisition pipeline for reviewscout.
//!
//! Ties the cache gateway, crawl engine, and document store together into
//! the one entry point the rest of the system calls
//! ([`pipeline::acquire_reviews`]).

pub mod gateway;
pub mod pipeline;

pub use pipeline::{
    AcquireConfig, AcquireOutcome, AcquireSource, ProgressReporter, SilentProgress,
    acquire_reviews,
};
