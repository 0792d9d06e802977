//! HTTP 请求与响应结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Direction, TransactionFilter};
use crate::service::SignInCommand;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// 签到请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 64, message = "NFC 编码长度必须在1-64个字符之间"))]
    pub code: String,
    #[validate(range(min = 1, message = "会员 ID 无效"))]
    pub member_id: i64,
    #[validate(range(min = -90.0, max = 90.0, message = "纬度超出范围"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "经度超出范围"))]
    pub longitude: Option<f64>,
    pub sign_in_time: Option<DateTime<Utc>>,
}

impl From<SignInRequest> for SignInCommand {
    fn from(req: SignInRequest) -> Self {
        Self {
            code: req.code,
            member_id: req.member_id,
            latitude: req.latitude,
            longitude: req.longitude,
            sign_in_time: req.sign_in_time,
        }
    }
}

/// 参与抽奖请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipateRequest {
    #[validate(range(min = 1, message = "会员 ID 无效"))]
    pub member_id: i64,
}

/// 流水查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    pub direction: Option<Direction>,
    pub voucher_type: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl TransactionQuery {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            direction: self.direction,
            voucher_type: self.voucher_type.clone().filter(|v| !v.is_empty()),
        }
    }
}
