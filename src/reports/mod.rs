/// 신고
/// 누구나 신고를 접수할 수 있고, 처리(검토/확정/기각)는 moderation 모듈이 담당한다.
// region:    --- Imports
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::NewNotification;
use crate::trust::ViolationLevel;
use crate::users::{require_user, UserUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Model
text_enum! {
    pub enum ReportStatus {
        Pending => "PENDING",
        Reviewed => "REVIEWED",
        Resolved => "RESOLVED",
        Rejected => "REJECTED",
    }
}

impl ReportStatus {
    /// 아직 결론이 나지 않은 상태
    pub fn is_open(&self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::Reviewed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Report {
    pub id: i64,
    pub reporter_id: i64,
    pub reported_user_id: i64,
    #[sqlx(try_from = "String")]
    pub level: ViolationLevel,
    pub reason: String,
    pub evidence_urls: Vec<String>,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    pub reviewer_id: Option<i64>,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// 신고 접수 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub reporter_id: i64,
    pub reported_user_id: i64,
    pub level: ViolationLevel,
    pub reason: String,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

/// 신고 처리 결과 (신고 상태 + 제재 + 알림을 한 번에 기록)
#[derive(Debug, Clone)]
pub struct ReportDecision {
    pub report_id: i64,
    /// 이 상태 중 하나일 때만 적용
    pub from: Vec<ReportStatus>,
    pub to: ReportStatus,
    pub reviewer_id: i64,
    pub resolution_note: Option<String>,
    pub sanction: Option<UserUpdate>,
    pub notifications: Vec<NewNotification>,
    pub at: DateTime<Utc>,
}
// endregion: --- Model

// region:    --- Commands
/// 신고 접수
pub async fn submit_report(
    store: &dyn Store,
    clock: &dyn Clock,
    new: NewReport,
) -> MarketResult<Report> {
    info!(
        "{:<12} --> 신고 접수 reporter: {}, reported: {}, level: {}",
        "Report", new.reporter_id, new.reported_user_id, new.level
    );
    if new.reporter_id == new.reported_user_id {
        return Err(MarketError::Validation(
            "자기 자신은 신고할 수 없습니다.".to_string(),
        ));
    }
    if new.reason.trim().is_empty() {
        return Err(MarketError::Validation("신고 사유가 비어 있습니다.".to_string()));
    }
    require_user(store, new.reporter_id).await?;
    require_user(store, new.reported_user_id).await?;

    store.insert_report(new, clock.now()).await
}

/// 신고 조회
pub async fn get_report(store: &dyn Store, report_id: i64) -> MarketResult<Report> {
    store
        .report(report_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("신고 {report_id}")))
}

/// 신고 목록 조회
pub async fn list_reports(
    store: &dyn Store,
    status: Option<ReportStatus>,
) -> MarketResult<Vec<Report>> {
    store.reports(status).await
}
// endregion: --- Commands
