//! HTTP 处理器
//!
//! 只做参数解析与校验，业务逻辑全部委托给服务层

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use tracing::info;
use validator::Validate;

use crate::api::dto::{ApiResponse, PageResponse, ParticipateRequest, SignInRequest, TransactionQuery};
use crate::api::state::AppState;
use crate::error::Result;
use crate::models::{BalanceView, MemberGiftExchange, OwnerType, WalletType};
use crate::service::{MemberLevelDto, ParticipateResult, SignInResult};
use crate::wallet::TransactionView;

// ==================== 签到与抽奖 ====================

/// 签到
///
/// POST /api/v1/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<ApiResponse<SignInResult>>> {
    req.validate()?;

    let result = state.sign_in_service.sign_in(req.into()).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// 参与抽奖
///
/// POST /api/v1/lucky-draws/{id}/participate
pub async fn participate(
    State(state): State<AppState>,
    Path(lucky_draw_id): Path<i64>,
    Json(req): Json<ParticipateRequest>,
) -> Result<Json<ApiResponse<ParticipateResult>>> {
    req.validate()?;

    let result = state
        .lucky_draw_service
        .participate(req.member_id, lucky_draw_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

// ==================== 钱包与等级查询 ====================

/// GET /api/v1/wallets/{walletType}/{ownerType}/{ownerId}/balance
pub async fn get_balance(
    State(state): State<AppState>,
    Path((wallet_type, owner_type, owner_id)): Path<(WalletType, OwnerType, i64)>,
) -> Result<Json<ApiResponse<BalanceView>>> {
    let balance = state
        .wallet_service
        .get_balance(wallet_type, owner_type, owner_id)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// GET /api/v1/wallets/{walletType}/{ownerType}/{ownerId}/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Path((wallet_type, owner_type, owner_id)): Path<(WalletType, OwnerType, i64)>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<PageResponse<TransactionView>>>> {
    let page = state
        .wallet_service
        .page_transactions(
            wallet_type,
            owner_type,
            owner_id,
            &query.filter(),
            query.page,
            query.page_size,
        )
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        page.items,
        page.total,
        page.page,
        page.page_size,
    ))))
}

/// GET /api/v1/brands/{brandId}/members/{memberId}/level
pub async fn get_member_level(
    State(state): State<AppState>,
    Path((brand_id, member_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<MemberLevelDto>>> {
    let level = state
        .wallet_service
        .get_member_level(brand_id, member_id)
        .await?;
    Ok(Json(ApiResponse::success(level)))
}

// ==================== 礼品兑换 ====================

/// POST /api/v1/gift-exchanges/{id}/settle
pub async fn settle_gift_exchange(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MemberGiftExchange>>> {
    let exchange = state.lucky_draw_service.settle_gift_exchange(id).await?;
    info!(id = id, "Gift exchange settled");
    Ok(Json(ApiResponse::success(exchange)))
}

/// POST /api/v1/gift-exchanges/{id}/cancel
pub async fn cancel_gift_exchange(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MemberGiftExchange>>> {
    let exchange = state.lucky_draw_service.cancel_gift_exchange(id).await?;
    info!(id = id, "Gift exchange cancelled");
    Ok(Json(ApiResponse::success(exchange)))
}

// ==================== 探针 ====================

/// 存活探针
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "loyalty-service"
    }))
}

/// 就绪探针：检查数据库和 Redis 连接
pub async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    let db_ok = state.db.health_check().await.is_ok();
    let cache_ok = state.cache.health_check().await.is_ok();
    let all_ok = db_ok && cache_ok;

    Json(json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": "loyalty-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" },
            "redis": if cache_ok { "ok" } else { "fail" }
        }
    }))
}
