// region:    --- Imports
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

// endregion: --- Imports

// region:    --- Error
/// 마켓 서비스 공통 에러
/// 응답 본문의 `code` 값은 클라이언트가 분기에 사용하므로 변경하지 않는다.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("{0}을(를) 찾을 수 없습니다.")]
    NotFound(String),

    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,

    #[error("경매가 이미 종료되었습니다.")]
    AlreadyEnded,

    #[error("입찰 금액이 최소 입찰가보다 낮습니다. (입찰: {bid_amount}, 최소: {minimum})")]
    LowBid { bid_amount: i64, minimum: i64 },

    #[error("즉시 구매가 설정되지 않은 경매입니다.")]
    NoBuyNow,

    #[error("잘못된 상태입니다: {0}")]
    InvalidStatus(String),

    #[error("권한이 없습니다: {0}")]
    Forbidden(String),

    #[error("거래 자격이 없습니다: {0}")]
    Ineligible(String),

    #[error("잘못된 요청입니다: {0}")]
    Validation(String),

    #[error("버전 충돌")]
    VersionConflict,

    #[error("최대 재시도 횟수 초과")]
    MaxRetriesExceeded,

    #[error("설정 오류: {0}")]
    Config(String),

    #[error("메시지 브로커 오류: {0}")]
    Broker(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type MarketResult<T> = Result<T, MarketError>;

impl MarketError {
    pub fn not_found(what: impl Into<String>) -> Self {
        MarketError::NotFound(what.into())
    }

    /// 응답 본문에 실리는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::NotFound(_) => "NOT_FOUND",
            MarketError::NotStarted => "NOT_STARTED",
            MarketError::AlreadyEnded => "ALREADY_ENDED",
            MarketError::LowBid { .. } => "LOW_BID",
            MarketError::NoBuyNow => "NO_BUY_NOW",
            MarketError::InvalidStatus(_) => "INVALID_STATUS",
            MarketError::Forbidden(_) => "FORBIDDEN",
            MarketError::Ineligible(_) => "INELIGIBLE",
            MarketError::Validation(_) => "VALIDATION",
            MarketError::VersionConflict => "VERSION_CONFLICT",
            MarketError::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
            MarketError::Config(_) => "CONFIG",
            MarketError::Broker(_) => "BROKER",
            MarketError::Database(_) => "DATABASE",
            MarketError::Serialization(_) => "SERIALIZATION",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::Forbidden(_) | MarketError::Ineligible(_) => StatusCode::FORBIDDEN,
            MarketError::VersionConflict | MarketError::MaxRetriesExceeded => StatusCode::CONFLICT,
            MarketError::Config(_)
            | MarketError::Broker(_)
            | MarketError::Database(_)
            | MarketError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{:<12} --> 처리 중 오류 발생: {:?}", "Error", self);
        }

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let MarketError::LowBid { bid_amount, minimum } = &self {
            body["bid_amount"] = serde_json::json!(bid_amount);
            body["minimum"] = serde_json::json!(minimum);
        }

        (status, Json(body)).into_response()
    }
}

// 추출기 거부는 모두 잘못된 요청으로 응답
impl From<JsonRejection> for MarketError {
    fn from(rejection: JsonRejection) -> Self {
        MarketError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for MarketError {
    fn from(rejection: PathRejection) -> Self {
        MarketError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for MarketError {
    fn from(rejection: QueryRejection) -> Self {
        MarketError::Validation(rejection.body_text())
    }
}
// endregion: --- Error
