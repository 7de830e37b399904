/// 제재, 정지 해제, 월간 신뢰도 회복
/// 신뢰도와 정지 상태는 사용자 version 조건부 쓰기로만 바뀐다.
// region:    --- Imports
use super::MAX_RETRIES;
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::{NewNotification, NotificationKind};
use crate::trust::{apply_monthly_recovery, apply_violation, SuspensionTerm, ViolationLevel};
use crate::users::{require_admin, require_user, User, UserUpdate};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Sanction
/// 위반 적용 (신뢰도 차감 + 등급별 정지)
/// 이미 더 긴 정지가 걸려 있으면 그 기간을 유지하고, 영구 정지는 줄이지 않는다.
/// 위반이 적용된 달에는 월간 회복을 하지 않는다.
pub fn sanction(user: &User, level: ViolationLevel, reason: &str, now: DateTime<Utc>) -> UserUpdate {
    let mut update = UserUpdate::from_user(user);
    update.trust_score = apply_violation(user.trust_score, level);
    update.last_recovery_at = Some(now);

    let body = match level.suspension() {
        SuspensionTerm::None => {
            let score = update.trust_score;
            return update.notify(NewNotification::new(
                user.id,
                NotificationKind::ViolationWarning,
                "경고",
                format!(
                    "{} 위반으로 신뢰도가 {}점이 되었습니다. 사유: {}",
                    level, score, reason
                ),
            ));
        }
        SuspensionTerm::Permanent => {
            update.suspended_until = None;
            format!("계정이 영구 정지되었습니다. 사유: {reason}")
        }
        SuspensionTerm::For(term) => {
            let until = now + term;
            update.suspended_until = if user.is_permanently_suspended() {
                None
            } else if user.is_suspended_at(now) {
                user.suspended_until.map(|current| current.max(until))
            } else {
                Some(until)
            };
            match update.suspended_until {
                Some(until) => format!("계정이 {until}까지 정지되었습니다. 사유: {reason}"),
                None => format!("계정이 영구 정지 상태입니다. 사유: {reason}"),
            }
        }
    };

    update.suspended = true;
    update.suspension_reason = Some(reason.to_string());
    update.notify(NewNotification::new(
        user.id,
        NotificationKind::AccountSuspended,
        "계정 정지",
        body,
    ))
}

/// 사용자를 읽어 갱신을 만들고 조건부 쓰기, 충돌 시 다시 읽어 재시도
async fn update_user_with_retry<F>(
    store: &dyn Store,
    clock: &dyn Clock,
    user_id: i64,
    plan: F,
) -> MarketResult<User>
where
    F: Fn(&User, DateTime<Utc>) -> MarketResult<UserUpdate> + Send + Sync,
{
    for attempt in 1..=MAX_RETRIES {
        let user = require_user(store, user_id).await?;
        let now = clock.now();
        match store.update_user(plan(&user, now)?, now).await {
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 사용자 {} 버전 충돌: 재시도 ({}/{})",
                    "Moderation", user_id, attempt, MAX_RETRIES
                );
                tokio::task::yield_now().await;
            }
            result => return result,
        }
    }
    Err(MarketError::MaxRetriesExceeded)
}

/// 사용자 정지 (관리자 전용)
pub async fn suspend_user(
    store: &dyn Store,
    clock: &dyn Clock,
    user_id: i64,
    admin_id: i64,
    level: ViolationLevel,
    reason: String,
) -> MarketResult<User> {
    info!(
        "{:<12} --> 사용자 정지 id: {}, admin: {}, level: {}",
        "Moderation", user_id, admin_id, level
    );
    if reason.trim().is_empty() {
        return Err(MarketError::Validation("정지 사유가 비어 있습니다.".to_string()));
    }
    if user_id == admin_id {
        return Err(MarketError::Validation(
            "자기 자신은 정지할 수 없습니다.".to_string(),
        ));
    }
    require_admin(store, admin_id).await?;

    update_user_with_retry(store, clock, user_id, |user, now| {
        Ok(sanction(user, level, &reason, now))
    })
    .await
}

/// 정지 해제 (관리자 전용)
pub async fn unsuspend_user(
    store: &dyn Store,
    clock: &dyn Clock,
    user_id: i64,
    admin_id: i64,
) -> MarketResult<User> {
    info!(
        "{:<12} --> 사용자 정지 해제 id: {}, admin: {}",
        "Moderation", user_id, admin_id
    );
    require_admin(store, admin_id).await?;

    update_user_with_retry(store, clock, user_id, |user, _now| {
        if !user.suspended {
            return Err(MarketError::InvalidStatus(format!(
                "사용자 {}는 정지 상태가 아닙니다.",
                user.id
            )));
        }
        Ok(UserUpdate::from_user(user)
            .lift_suspension()
            .notify(suspension_lifted(user.id)))
    })
    .await
}

fn suspension_lifted(user_id: i64) -> NewNotification {
    NewNotification::new(
        user_id,
        NotificationKind::SuspensionLifted,
        "정지 해제",
        "계정 정지가 해제되었습니다.",
    )
}
// endregion: --- Sanction

// region:    --- Scheduled
/// 기간이 끝난 정지 해제
pub async fn lift_expired_suspensions(store: &dyn Store, clock: &dyn Clock) -> MarketResult<usize> {
    let now = clock.now();
    let mut lifted = 0;

    for user in store.users_with_expired_suspension(now).await? {
        let update = UserUpdate::from_user(&user)
            .lift_suspension()
            .notify(suspension_lifted(user.id));
        match store.update_user(update, now).await {
            Ok(_) => {
                info!("{:<12} --> 정지 기간 만료: user={}", "Moderation", user.id);
                lifted += 1;
            }
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 사용자 {} 정지 해제 중 버전 충돌: 다음 주기에 재시도",
                    "Moderation", user.id
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(lifted)
}

/// 월간 신뢰도 회복
/// 이번 달에 아직 회복(또는 위반)이 없었던 사용자에게 한 번씩 적용한다.
pub async fn recover_trust_scores(store: &dyn Store, clock: &dyn Clock) -> MarketResult<usize> {
    let now = clock.now();
    let Some(month_start) = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
    else {
        return Ok(0);
    };
    let mut recovered = 0;

    for user in store.users_due_recovery(month_start).await? {
        let Some(points) = apply_monthly_recovery(user.trust_score, user.last_recovery_at, now)
        else {
            continue;
        };

        let mut update = UserUpdate::from_user(&user);
        update.trust_score = points;
        update.last_recovery_at = Some(now);
        let update = update.notify(NewNotification::new(
            user.id,
            NotificationKind::TrustRecovered,
            "신뢰도 회복",
            format!("이번 달 신뢰도가 {}점으로 회복되었습니다.", points),
        ));

        match store.update_user(update, now).await {
            Ok(_) => recovered += 1,
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 사용자 {} 신뢰도 회복 중 버전 충돌: 다음 주기에 재시도",
                    "Moderation", user.id
                );
            }
            Err(e) => return Err(e),
        }
    }

    if recovered > 0 {
        info!("{:<12} --> 월간 신뢰도 회복: {}명", "Moderation", recovered);
    }
    Ok(recovered)
}
// endregion: --- Scheduled
