//! 可观测性模块集成测试
//!
//! 未安装 recorder 时指标调用应为空操作，追踪上下文提取不应 panic。

use std::collections::HashMap;

mod metrics_tests {
    use loyalty_shared::observability::metrics::{
        record_http_request, record_ledger_posting, record_lucky_draw, record_period_transition,
        record_sign_in,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("POST", "/api/v1/sign-in", 200, 0.05);
        record_http_request("GET", "/api/v1/wallets/POINTS/MEMBER/1/balance", 200, 0.01);
        record_http_request("POST", "/api/v1/lucky-draws/1/participate", 409, 0.02);
        record_http_request("GET", "/api/not-found", 404, 0.01);
    }

    #[test]
    fn test_record_business_metrics() {
        record_sign_in("success", false, 0.04);
        record_sign_in("success", true, 0.09);
        record_sign_in("SIGN_IN_COOLDOWN", false, 0.01);

        record_ledger_posting("POINTS", "DEBIT", "NFC_SIGN_IN");
        record_ledger_posting("POINTS", "CREDIT", "LUCKY_DRAW");

        record_lucky_draw(1, true, "success", 0.03);
        record_lucky_draw(1, false, "success", 0.02);
        record_lucky_draw(2, false, "PRIZE_OUT_OF_STOCK", 0.02);

        record_period_transition("RETENTION_LEVEL", "renewed");
        record_period_transition("UP_LEVEL", "promoted");
        record_period_transition("CLOCK_IN", "finished");
    }

    #[test]
    fn test_metrics_with_edge_cases() {
        record_http_request("", "", 0, 0.0);

        let long_path = "/api/".to_string() + &"x".repeat(1000);
        record_http_request("GET", &long_path, 200, 0.01);

        // 负数 id 业务上不合理，但不应 panic
        record_lucky_draw(-1, false, "test", 0.000001);
        record_sign_in("", false, 999.99);
    }
}

mod tracing_tests {
    use super::*;
    use loyalty_shared::observability::tracing::{current_trace_id, extract_from_headers};
    use opentelemetry::trace::TraceContextExt;

    #[test]
    fn test_extract_from_empty_headers() {
        let context = extract_from_headers(&HashMap::new());
        assert!(!context.has_active_span());
    }

    #[test]
    fn test_extract_from_valid_traceparent() {
        let mut headers = HashMap::new();
        headers.insert(
            "traceparent".to_string(),
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string(),
        );

        let context = extract_from_headers(&headers);
        let span_context = context.span().span_context().clone();

        assert!(span_context.is_valid());
        assert_eq!(
            span_context.trace_id().to_string(),
            "0af7651916cd43dd8448eb211c80319c"
        );
        assert_eq!(span_context.span_id().to_string(), "b7ad6b7169203331");
    }

    #[test]
    fn test_extract_from_malformed_traceparent() {
        let cases = [
            "",
            "invalid-format",
            "00-0af7651916cd43dd8448eb211c80319c",
            "00-invalid-b7ad6b7169203331-01",
            "00-0af7651916cd43dd8448eb211c80319c-invalid-01",
        ];

        for invalid in cases {
            let mut headers = HashMap::new();
            headers.insert("traceparent".to_string(), invalid.to_string());
            let context = extract_from_headers(&headers);
            assert!(!context.span().span_context().is_valid());
        }
    }

    #[test]
    fn test_current_trace_id_without_init() {
        assert!(current_trace_id().is_none());
    }
}

mod middleware_tests {
    use loyalty_shared::observability::middleware::RequestId;

    #[test]
    fn test_request_id() {
        let id = RequestId("req-123".to_string());
        let cloned = id.clone();
        assert_eq!(cloned.as_str(), "req-123");
        assert!(format!("{:?}", id).contains("req-123"));
    }
}
