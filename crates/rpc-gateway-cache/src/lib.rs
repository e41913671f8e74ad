#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod cache;
pub mod cacheability;

pub use cache::RpcCache;
pub use cacheability::{classify, problematic_reason, resolve_ttl, Cacheability, ProblematicReason};
