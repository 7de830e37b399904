// region:    --- Imports
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::NewNotification;
use crate::trust::Eligibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Model
text_enum! {
    pub enum Role {
        User => "USER",
        Moderator => "MODERATOR",
        Admin => "ADMIN",
    }
}

impl Role {
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

// 사용자 모델
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub trust_score: i32,
    pub suspended: bool,
    pub suspension_reason: Option<String>,
    /// `suspended` 이면서 `None` 이면 영구 정지
    pub suspended_until: Option<DateTime<Utc>>,
    pub last_recovery_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.suspended && self.suspended_until.map_or(true, |until| now < until)
    }

    pub fn is_permanently_suspended(&self) -> bool {
        self.suspended && self.suspended_until.is_none()
    }

    pub fn eligibility(&self, now: DateTime<Utc>) -> Eligibility {
        Eligibility::of(self.trust_score, self.is_suspended_at(now))
    }
}

/// 가입 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub display_name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

impl NewUser {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            display_name: display_name.into(),
            email: email.into(),
            role,
        }
    }
}

/// 사용자 상태 갱신 (version 기반 조건부 쓰기)
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub user_id: i64,
    pub expected_version: i64,
    pub trust_score: i32,
    pub suspended: bool,
    pub suspension_reason: Option<String>,
    pub suspended_until: Option<DateTime<Utc>>,
    pub last_recovery_at: Option<DateTime<Utc>>,
    pub notifications: Vec<NewNotification>,
}

impl UserUpdate {
    /// 현재 상태를 그대로 옮긴 갱신 (필드를 바꿔서 사용)
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            expected_version: user.version,
            trust_score: user.trust_score,
            suspended: user.suspended,
            suspension_reason: user.suspension_reason.clone(),
            suspended_until: user.suspended_until,
            last_recovery_at: user.last_recovery_at,
            notifications: Vec::new(),
        }
    }

    pub fn lift_suspension(mut self) -> Self {
        self.suspended = false;
        self.suspension_reason = None;
        self.suspended_until = None;
        self
    }

    pub fn notify(mut self, notification: NewNotification) -> Self {
        self.notifications.push(notification);
        self
    }
}

/// 사용자 조회 응답
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub suspended_now: bool,
    pub eligibility: Eligibility,
}

impl UserView {
    pub fn at(user: User, now: DateTime<Utc>) -> Self {
        Self {
            suspended_now: user.is_suspended_at(now),
            eligibility: user.eligibility(now),
            user,
        }
    }
}
// endregion: --- Model

// region:    --- Commands
/// 가입
pub async fn register_user(
    store: &dyn Store,
    clock: &dyn Clock,
    new: NewUser,
) -> MarketResult<User> {
    info!("{:<12} --> 가입 요청: {}", "User", new.email);
    if new.display_name.trim().is_empty() {
        return Err(MarketError::Validation("닉네임이 비어 있습니다.".to_string()));
    }
    if !new.email.contains('@') {
        return Err(MarketError::Validation(format!(
            "잘못된 이메일입니다: {}",
            new.email
        )));
    }
    store.insert_user(new, clock.now()).await
}

/// 사용자 조회
pub async fn require_user(store: &dyn Store, user_id: i64) -> MarketResult<User> {
    store
        .user(user_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("사용자 {user_id}")))
}

/// 모더레이터 권한 확인
pub async fn require_moderator(store: &dyn Store, user_id: i64) -> MarketResult<User> {
    let user = require_user(store, user_id).await?;
    if !user.role.can_moderate() {
        return Err(MarketError::Forbidden(format!(
            "사용자 {user_id}는 관리 권한이 없습니다."
        )));
    }
    Ok(user)
}

/// 관리자 권한 확인
pub async fn require_admin(store: &dyn Store, user_id: i64) -> MarketResult<User> {
    let user = require_user(store, user_id).await?;
    if !user.role.is_admin() {
        return Err(MarketError::Forbidden(format!(
            "사용자 {user_id}는 관리자가 아닙니다."
        )));
    }
    Ok(user)
}
// endregion: --- Commands

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::database::memory::MemoryStore;

    #[tokio::test]
    async fn new_users_start_with_full_trust() {
        let store = MemoryStore::new();
        let user = register_user(
            &store,
            &SystemClock,
            NewUser::new("민수", "minsu@example.com", Role::User),
        )
        .await
        .unwrap();

        assert_eq!(user.trust_score, 100);
        assert!(!user.suspended);
        let eligibility = user.eligibility(Utc::now());
        assert!(eligibility.can_sell && eligibility.can_buy);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let store = MemoryStore::new();
        let err = register_user(
            &store,
            &SystemClock,
            NewUser::new("민수", "not-an-email", Role::User),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn plain_users_cannot_moderate() {
        let store = MemoryStore::new();
        let user = register_user(
            &store,
            &SystemClock,
            NewUser::new("민수", "minsu@example.com", Role::User),
        )
        .await
        .unwrap();
        let err = require_moderator(&store, user.id).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn expired_suspension_no_longer_applies() {
        let now = Utc::now();
        let user = User {
            id: 1,
            display_name: "민수".to_string(),
            email: "minsu@example.com".to_string(),
            role: Role::User,
            trust_score: 70,
            suspended: true,
            suspension_reason: Some("사기 의심".to_string()),
            suspended_until: Some(now - chrono::Duration::seconds(1)),
            last_recovery_at: None,
            version: 3,
            created_at: now,
        };
        assert!(!user.is_suspended_at(now));
        assert!(user.eligibility(now).can_sell);
    }
}
