//! 鉴权 HTTP 接口处理模块。

mod http;
mod issue;

pub(crate) use http::{example_handler, token_handler};
