/// 마켓 스케줄러
/// 시간에 따른 상태 변경은 모두 이 스케줄러가 담당한다.
/// 1. 종료 시각이 지난 경매 종료
/// 2. 기간이 끝난 정지 해제
/// 3. 월간 신뢰도 회복
/// 4. 아웃박스 발행
/// 단계별 오류는 로그만 남기고 다음 단계와 다음 주기는 계속 진행한다.
// region:    --- Imports
use crate::auction::lifecycle::close_expired_auctions;
use crate::clock::Clock;
use crate::database::Store;
use crate::event_store::OutboxRelay;
use crate::moderation::{lift_expired_suspensions, recover_trust_scores};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Market Scheduler
pub struct MarketScheduler {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    relay: Arc<OutboxRelay>,
    period: Duration,
}

/// 한 주기 처리 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub auctions_closed: usize,
    pub suspensions_lifted: usize,
    pub users_recovered: usize,
    pub messages_published: usize,
}

impl MarketScheduler {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        relay: Arc<OutboxRelay>,
        period: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            relay,
            period,
        }
    }

    /// 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }

    /// 한 주기 실행
    pub async fn tick(&self) -> TickReport {
        let store = self.store.as_ref();
        let clock = self.clock.as_ref();
        let mut report = TickReport::default();

        match close_expired_auctions(store, clock).await {
            Ok(n) => report.auctions_closed = n,
            Err(e) => error!("{:<12} --> 경매 종료 처리 중 오류 발생: {:?}", "Scheduler", e),
        }
        match lift_expired_suspensions(store, clock).await {
            Ok(n) => report.suspensions_lifted = n,
            Err(e) => error!("{:<12} --> 정지 해제 처리 중 오류 발생: {:?}", "Scheduler", e),
        }
        match recover_trust_scores(store, clock).await {
            Ok(n) => report.users_recovered = n,
            Err(e) => error!("{:<12} --> 신뢰도 회복 처리 중 오류 발생: {:?}", "Scheduler", e),
        }
        match self.relay.relay_once().await {
            Ok(n) => report.messages_published = n,
            Err(e) => error!("{:<12} --> 아웃박스 발행 중 오류 발생: {:?}", "Scheduler", e),
        }

        debug!("{:<12} --> 주기 처리 완료: {:?}", "Scheduler", report);
        report
    }
}
// endregion: --- Market Scheduler

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::memory::MemoryStore;
    use crate::message_broker::LogPublisher;
    use crate::moderation::suspend_user;
    use crate::trust::ViolationLevel;
    use crate::users::{NewUser, Role};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn tick_runs_every_step() {
        let start = Utc.with_ymd_and_hms(2024, 7, 3, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(NewUser::new("관리자", "admin@example.com", Role::Admin), start)
            .await
            .unwrap();
        let user = store
            .insert_user(NewUser::new("민수", "minsu@example.com", Role::User), start)
            .await
            .unwrap();
        suspend_user(
            store.as_ref(),
            clock.as_ref(),
            user.id,
            admin.id,
            ViolationLevel::Low,
            "스팸".to_string(),
        )
        .await
        .unwrap();

        let relay = Arc::new(OutboxRelay::new(
            store.clone(),
            Arc::new(LogPublisher),
            clock.clone(),
            100,
        ));
        let scheduler = MarketScheduler::new(
            store.clone(),
            clock.clone(),
            relay,
            Duration::from_millis(10),
        );

        let first = scheduler.tick().await;
        assert_eq!(first.suspensions_lifted, 0);
        assert_eq!(first.messages_published, 1);

        clock.set(Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap());
        let second = scheduler.tick().await;
        assert_eq!(second.suspensions_lifted, 1);
        assert_eq!(second.users_recovered, 1);
        // 정지 해제 알림 + 회복 알림
        assert_eq!(second.messages_published, 2);

        let recovered = store.user(user.id).await.unwrap().unwrap();
        assert_eq!(recovered.trust_score, 100);
        assert!(!recovered.suspended);
    }
}
