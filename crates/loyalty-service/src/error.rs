//! 积分服务错误类型
//!
//! 业务错误与系统错误统一为 `LoyaltyError`，通过 `kind()` 归入六类错误分类，
//! 任何错误都会使所在的工作单元整体回滚，核心层不做自动重试。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use loyalty_shared::error::SharedError;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateVoucher,
    InsufficientBalance,
    PreconditionFailed,
    AllocationError,
    Unexpected,
}

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum LoyaltyError {
    // === 资源不存在 ===
    #[error("门店不存在: nfc_code={0}")]
    RestaurantNotFound(String),

    #[error("品牌未配置会员等级: brand_id={0}")]
    LevelDefinitionNotFound(i64),

    #[error("抽奖活动不存在: {0}")]
    LuckyDrawNotFound(i64),

    #[error("礼品兑换记录不存在: {0}")]
    GiftExchangeNotFound(i64),

    #[error("全局配置不存在")]
    SettingsNotFound,

    #[error("钱包类型未注册开户策略: {0}")]
    WalletTypeNotSupported(String),

    // === 账本 ===
    #[error("凭证已入账: voucher_type={voucher_type}, voucher={voucher}")]
    DuplicateVoucher {
        voucher_type: String,
        voucher: String,
    },

    #[error("余额不足: 需要 {required}, 可用 {available}")]
    InsufficientBalance { required: i64, available: i64 },

    // === 前置条件 ===
    #[error("门店已停用: restaurant_id={0}")]
    RestaurantDisabled(i64),

    #[error("开启地理围栏时必须上传经纬度")]
    LocationRequired,

    #[error("不在门店签到范围内: 距离 {distance_meters:.0} 米, 允许 {radius_meters:.0} 米")]
    GeofenceViolation {
        distance_meters: f64,
        radius_meters: f64,
    },

    #[error("签到过于频繁, 请 {remaining_seconds} 秒后再试")]
    SignInTooFrequent { remaining_seconds: i64 },

    #[error("抽奖活动未开始或已结束: {0}")]
    LuckyDrawInactive(i64),

    #[error("抽奖概率配置无效: {0}")]
    InvalidProbability(String),

    #[error("抽奖规则配置无效: {0}")]
    InvalidLuckyDrawRule(String),

    #[error("奖品已抽完: rule_id={0}")]
    PrizeOutOfStock(i64),

    #[error("礼品兑换状态不允许此操作: id={id}, current_status={current_status}")]
    InvalidGiftExchangeStatus { id: i64, current_status: String },

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 逻辑不变量 ===
    #[error("抽奖未命中任何规则: {0}")]
    Allocation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("基础设施错误: {0}")]
    Infrastructure(#[from] SharedError),

    #[error("事务超时: {0} 秒")]
    Timeout(u64),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, LoyaltyError>;

impl LoyaltyError {
    /// 归入错误分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RestaurantNotFound(_)
            | Self::LevelDefinitionNotFound(_)
            | Self::LuckyDrawNotFound(_)
            | Self::GiftExchangeNotFound(_)
            | Self::SettingsNotFound
            | Self::WalletTypeNotSupported(_) => ErrorKind::NotFound,
            Self::DuplicateVoucher { .. } => ErrorKind::DuplicateVoucher,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::RestaurantDisabled(_)
            | Self::LocationRequired
            | Self::GeofenceViolation { .. }
            | Self::SignInTooFrequent { .. }
            | Self::LuckyDrawInactive(_)
            | Self::InvalidProbability(_)
            | Self::InvalidLuckyDrawRule(_)
            | Self::PrizeOutOfStock(_)
            | Self::InvalidGiftExchangeStatus { .. }
            | Self::Validation(_) => ErrorKind::PreconditionFailed,
            Self::Allocation(_) => ErrorKind::AllocationError,
            Self::Database(_) | Self::Infrastructure(_) | Self::Timeout(_) | Self::Internal(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    /// 检查是否为业务错误（调用方可感知并处理）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::AllocationError | ErrorKind::Unexpected
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RestaurantNotFound(_) => "RESTAURANT_NOT_FOUND",
            Self::LevelDefinitionNotFound(_) => "LEVEL_DEFINITION_NOT_FOUND",
            Self::LuckyDrawNotFound(_) => "LUCKY_DRAW_NOT_FOUND",
            Self::GiftExchangeNotFound(_) => "GIFT_EXCHANGE_NOT_FOUND",
            Self::SettingsNotFound => "SETTINGS_NOT_FOUND",
            Self::WalletTypeNotSupported(_) => "WALLET_TYPE_NOT_SUPPORTED",
            Self::DuplicateVoucher { .. } => "DUPLICATE_VOUCHER",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::RestaurantDisabled(_) => "RESTAURANT_DISABLED",
            Self::LocationRequired => "LOCATION_REQUIRED",
            Self::GeofenceViolation { .. } => "OUT_OF_GEOFENCE",
            Self::SignInTooFrequent { .. } => "SIGN_IN_TOO_FREQUENT",
            Self::LuckyDrawInactive(_) => "LUCKY_DRAW_INACTIVE",
            Self::InvalidProbability(_) => "INVALID_PROBABILITY",
            Self::InvalidLuckyDrawRule(_) => "INVALID_LUCKY_DRAW_RULE",
            Self::PrizeOutOfStock(_) => "PRIZE_OUT_OF_STOCK",
            Self::InvalidGiftExchangeStatus { .. } => "INVALID_GIFT_EXCHANGE_STATUS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Allocation(_) => "ALLOCATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Infrastructure(_) => "INFRASTRUCTURE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::LocationRequired => StatusCode::BAD_REQUEST,
            _ => match self.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::DuplicateVoucher => StatusCode::CONFLICT,
                ErrorKind::InsufficientBalance => StatusCode::PAYMENT_REQUIRED,
                ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
                ErrorKind::AllocationError | ErrorKind::Unexpected => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// 冷却剩余秒数，仅签到过频时存在
    fn remaining_seconds(&self) -> Option<i64> {
        match self {
            Self::SignInTooFrequent { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}

impl IntoResponse for LoyaltyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if self.is_business_error() {
            self.to_string()
        } else {
            tracing::error!(error = %self, code = self.error_code(), "请求处理失败");
            "服务内部错误，请稍后重试".to_string()
        };

        let data = match self.remaining_seconds() {
            Some(remaining) => json!({ "remainingSeconds": remaining }),
            None => serde_json::Value::Null,
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": data
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for LoyaltyError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
