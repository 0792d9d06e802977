//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册业务指标描述，出现在 /metrics 的 HELP 注释中
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("sign_ins_total", "Total number of NFC sign-in attempts");
    metrics::describe_histogram!(
        "sign_in_duration_seconds",
        "NFC sign-in duration in seconds"
    );

    metrics::describe_counter!(
        "ledger_postings_total",
        "Total number of wallet ledger postings"
    );

    metrics::describe_counter!("lucky_draws_total", "Total number of lucky draw participations");
    metrics::describe_histogram!(
        "lucky_draw_duration_seconds",
        "Lucky draw participation duration in seconds"
    );

    metrics::describe_counter!(
        "period_transitions_total",
        "Total number of sign-in period transitions"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录签到
///
/// status 为 "success" 或错误码
#[inline]
pub fn record_sign_in(status: &str, level_up: bool, duration_secs: f64) {
    metrics::counter!(
        "sign_ins_total",
        "status" => status.to_string(),
        "level_up" => level_up.to_string()
    )
    .increment(1);

    metrics::histogram!("sign_in_duration_seconds", "status" => status.to_string())
        .record(duration_secs);
}

/// 记录一次账本记账
#[inline]
pub fn record_ledger_posting(wallet_type: &str, direction: &str, voucher_type: &str) {
    metrics::counter!(
        "ledger_postings_total",
        "wallet_type" => wallet_type.to_string(),
        "direction" => direction.to_string(),
        "voucher_type" => voucher_type.to_string()
    )
    .increment(1);
}

/// 记录抽奖
#[inline]
pub fn record_lucky_draw(lucky_draw_id: i64, won: bool, status: &str, duration_secs: f64) {
    metrics::counter!(
        "lucky_draws_total",
        "lucky_draw_id" => lucky_draw_id.to_string(),
        "won" => won.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("lucky_draw_duration_seconds", "status" => status.to_string())
        .record(duration_secs);
}

/// 记录周期状态迁移（created / progressed / succeeded / renewed）
#[inline]
pub fn record_period_transition(period_type: &str, transition: &str) {
    metrics::counter!(
        "period_transitions_total",
        "period_type" => period_type.to_string(),
        "transition" => transition.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 未安装 recorder 时记录函数为空操作
        record_http_request("GET", "/health", 200, 0.1);
        record_sign_in("success", true, 0.2);
        record_ledger_posting("POINTS", "DEBIT", "NFC_SIGN_IN");
        record_lucky_draw(1, false, "success", 0.05);
        record_period_transition("UP_LEVEL", "created");
    }
}
