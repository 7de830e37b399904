// region:    --- Imports
use super::{sanction, MAX_RETRIES};
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::{NewNotification, NotificationKind};
use crate::reports::{get_report, Report, ReportDecision, ReportStatus};
use crate::trust::SuspensionTerm;
use crate::users::{require_admin, require_moderator, require_user};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Report Workflow
/// 신고 검토 시작 (PENDING -> REVIEWED)
pub async fn review_report(
    store: &dyn Store,
    clock: &dyn Clock,
    report_id: i64,
    moderator_id: i64,
    note: Option<String>,
) -> MarketResult<Report> {
    info!(
        "{:<12} --> 신고 검토 id: {}, moderator: {}",
        "Moderation", report_id, moderator_id
    );
    require_moderator(store, moderator_id).await?;
    get_report(store, report_id).await?;

    store
        .commit_report(ReportDecision {
            report_id,
            from: vec![ReportStatus::Pending],
            to: ReportStatus::Reviewed,
            reviewer_id: moderator_id,
            resolution_note: note,
            sanction: None,
            notifications: Vec::new(),
            at: clock.now(),
        })
        .await
}

/// 신고 확정: 신고된 등급의 제재를 적용하고 신고자와 대상자에게 알린다.
/// 정지가 따르는 등급은 관리자만 확정할 수 있다.
pub async fn resolve_report(
    store: &dyn Store,
    clock: &dyn Clock,
    report_id: i64,
    moderator_id: i64,
    note: Option<String>,
) -> MarketResult<Report> {
    info!(
        "{:<12} --> 신고 확정 id: {}, moderator: {}",
        "Moderation", report_id, moderator_id
    );
    require_moderator(store, moderator_id).await?;
    let level = get_report(store, report_id).await?.level;
    if !matches!(level.suspension(), SuspensionTerm::None) {
        require_admin(store, moderator_id).await?;
    }

    for attempt in 1..=MAX_RETRIES {
        let report = get_report(store, report_id).await?;
        if !report.status.is_open() {
            return Err(closed(&report));
        }
        let reported = require_user(store, report.reported_user_id).await?;
        let now = clock.now();

        let decision = ReportDecision {
            report_id,
            from: vec![ReportStatus::Pending, ReportStatus::Reviewed],
            to: ReportStatus::Resolved,
            reviewer_id: moderator_id,
            resolution_note: note.clone(),
            sanction: Some(sanction(&reported, report.level, &report.reason, now)),
            notifications: vec![NewNotification::new(
                report.reporter_id,
                NotificationKind::ReportResolved,
                "신고 처리 완료",
                format!("신고 #{}가 처리되어 제재가 적용되었습니다.", report.id),
            )
            .about(report.id)],
            at: now,
        };

        match store.commit_report(decision).await {
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 신고 {} 처리 중 사용자 버전 충돌: 재시도 ({}/{})",
                    "Moderation", report_id, attempt, MAX_RETRIES
                );
                tokio::task::yield_now().await;
            }
            result => return result,
        }
    }

    Err(MarketError::MaxRetriesExceeded)
}

/// 신고 기각
pub async fn reject_report(
    store: &dyn Store,
    clock: &dyn Clock,
    report_id: i64,
    moderator_id: i64,
    note: Option<String>,
) -> MarketResult<Report> {
    info!(
        "{:<12} --> 신고 기각 id: {}, moderator: {}",
        "Moderation", report_id, moderator_id
    );
    require_moderator(store, moderator_id).await?;
    let report = get_report(store, report_id).await?;

    store
        .commit_report(ReportDecision {
            report_id,
            from: vec![ReportStatus::Pending, ReportStatus::Reviewed],
            to: ReportStatus::Rejected,
            reviewer_id: moderator_id,
            resolution_note: note,
            sanction: None,
            notifications: vec![NewNotification::new(
                report.reporter_id,
                NotificationKind::ReportRejected,
                "신고 기각",
                format!("신고 #{}가 기각되었습니다.", report.id),
            )
            .about(report.id)],
            at: clock.now(),
        })
        .await
}

fn closed(report: &Report) -> MarketError {
    MarketError::InvalidStatus(format!(
        "신고 {}는 이미 {} 상태입니다.",
        report.id, report.status
    ))
}
// endregion: --- Report Workflow
