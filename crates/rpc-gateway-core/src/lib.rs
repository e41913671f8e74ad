#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod breaker;
mod coalescer;
pub mod cli;
pub mod cors;
mod dispatcher;
mod fingerprint;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod pipeline;
mod queue;
pub mod server;
