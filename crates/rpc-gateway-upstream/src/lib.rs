#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod fallback;
mod upstream;

pub use fallback::{classify, FallbackReason};
pub use upstream::{Upstream, UpstreamError};
