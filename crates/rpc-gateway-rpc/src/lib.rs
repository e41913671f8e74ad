#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod error;
pub mod request;
pub mod response;

pub use error::RpcError;
pub use request::{Id, RequestParams, RpcCall, RpcMethodCall, RpcNotification, Version};
pub use response::{ResponseResult, RpcResponse};
