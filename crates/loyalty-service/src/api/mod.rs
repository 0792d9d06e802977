//! HTTP 接口层
//!
//! axum 路由、处理器与请求响应结构

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::{api_routes, app};
pub use state::AppState;
