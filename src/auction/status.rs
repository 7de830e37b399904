/// 경매 상태 판정
/// 저장된 상태(status)는 스케줄러가 갱신하지만 갱신 주기 사이에는 뒤처질 수 있다.
/// 조회와 입찰은 항상 `AuctionPhase::evaluate` 결과를 기준으로 한다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::Serialize;

// endregion: --- Imports

// region:    --- Status
text_enum! {
    /// 저장되는 경매 상태
    pub enum AuctionStatus {
        /// 관리자 승인 대기
        Pending => "PENDING",
        Active => "ACTIVE",
        Ended => "ENDED",
    }
}

/// 현재 시각 기준으로 판정한 경매 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionPhase {
    Pending,
    NotStarted,
    Active,
    Ended,
}

impl AuctionPhase {
    /// 종료 시각이 지났으면 저장된 상태와 관계없이 종료로 본다.
    pub fn evaluate(
        status: AuctionStatus,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        if status == AuctionStatus::Ended || now > end_time {
            return AuctionPhase::Ended;
        }
        if status == AuctionStatus::Pending {
            return AuctionPhase::Pending;
        }
        if now < start_time {
            return AuctionPhase::NotStarted;
        }
        AuctionPhase::Active
    }
}
// endregion: --- Status

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        (start, start + Duration::hours(2))
    }

    #[test]
    fn stale_active_status_is_ended_after_end_time() {
        let (start, end) = window();
        let phase = AuctionPhase::evaluate(
            AuctionStatus::Active,
            start,
            end,
            end + Duration::seconds(1),
        );
        assert_eq!(phase, AuctionPhase::Ended);
    }

    #[test]
    fn end_time_itself_is_still_active() {
        let (start, end) = window();
        assert_eq!(
            AuctionPhase::evaluate(AuctionStatus::Active, start, end, end),
            AuctionPhase::Active
        );
    }

    #[test]
    fn approved_auction_before_start_is_not_started() {
        let (start, end) = window();
        let phase = AuctionPhase::evaluate(
            AuctionStatus::Active,
            start,
            end,
            start - Duration::minutes(1),
        );
        assert_eq!(phase, AuctionPhase::NotStarted);
    }

    #[test]
    fn pending_auction_stays_pending_inside_window() {
        let (start, end) = window();
        let phase = AuctionPhase::evaluate(AuctionStatus::Pending, start, end, start);
        assert_eq!(phase, AuctionPhase::Pending);
    }

    #[test]
    fn pending_auction_past_end_is_ended() {
        let (start, end) = window();
        let phase = AuctionPhase::evaluate(
            AuctionStatus::Pending,
            start,
            end,
            end + Duration::hours(1),
        );
        assert_eq!(phase, AuctionPhase::Ended);
    }

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("ENDED".parse::<AuctionStatus>().unwrap(), AuctionStatus::Ended);
        assert!("CLOSED".parse::<AuctionStatus>().is_err());
    }
}
