//! HTTP 边界：错误到响应的转换。

pub(crate) mod error;
