/// 신뢰도 점수 규칙
/// 위반 등급별 차감, 월간 회복, 거래 자격 판정
// region:    --- Imports
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

// endregion: --- Imports

// region:    --- Constants
pub const MAX_TRUST_SCORE: i32 = 100;
pub const INITIAL_TRUST_SCORE: i32 = MAX_TRUST_SCORE;
/// 이 점수를 초과해야 판매 가능
pub const SELL_THRESHOLD: i32 = 60;
/// 이 점수를 초과해야 구매 가능
pub const BUY_THRESHOLD: i32 = 40;
pub const MONTHLY_RECOVERY: i32 = 10;

// endregion: --- Constants

// region:    --- Violation
text_enum! {
    /// 위반 등급
    pub enum ViolationLevel {
        Warning => "WARNING",
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Severe => "SEVERE",
        Permanent => "PERMANENT",
    }
}

/// 정지 기간
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionTerm {
    None,
    For(Duration),
    Permanent,
}

impl ViolationLevel {
    pub fn deduction(&self) -> i32 {
        match self {
            ViolationLevel::Warning => 5,
            ViolationLevel::Low => 10,
            ViolationLevel::Medium => 20,
            ViolationLevel::High => 30,
            ViolationLevel::Severe => 50,
            ViolationLevel::Permanent => MAX_TRUST_SCORE,
        }
    }

    pub fn suspension(&self) -> SuspensionTerm {
        match self {
            ViolationLevel::Warning => SuspensionTerm::None,
            ViolationLevel::Low => SuspensionTerm::For(Duration::days(1)),
            ViolationLevel::Medium => SuspensionTerm::For(Duration::days(3)),
            ViolationLevel::High => SuspensionTerm::For(Duration::days(7)),
            ViolationLevel::Severe => SuspensionTerm::For(Duration::days(30)),
            ViolationLevel::Permanent => SuspensionTerm::Permanent,
        }
    }
}

/// 위반 적용 후 점수 (0 미만으로 내려가지 않음)
pub fn apply_violation(points: i32, level: ViolationLevel) -> i32 {
    (points - level.deduction()).max(0)
}

/// 월간 회복 적용
/// 이번 달에 이미 회복을 적용했다면 `None`
pub fn apply_monthly_recovery(
    points: i32,
    last_recovery_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i32> {
    if let Some(last) = last_recovery_at {
        if last.year() == now.year() && last.month() == now.month() {
            return None;
        }
    }
    Some((points + MONTHLY_RECOVERY).min(MAX_TRUST_SCORE))
}
// endregion: --- Violation

// region:    --- Eligibility
/// 거래 자격
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub can_sell: bool,
    pub can_buy: bool,
}

impl Eligibility {
    pub fn of(points: i32, suspended: bool) -> Self {
        if suspended {
            return Self {
                can_sell: false,
                can_buy: false,
            };
        }
        Self {
            can_sell: points > SELL_THRESHOLD,
            can_buy: points > BUY_THRESHOLD,
        }
    }
}
// endregion: --- Eligibility

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deductions_follow_level_table() {
        let expected = [
            (ViolationLevel::Warning, 95),
            (ViolationLevel::Low, 90),
            (ViolationLevel::Medium, 80),
            (ViolationLevel::High, 70),
            (ViolationLevel::Severe, 50),
            (ViolationLevel::Permanent, 0),
        ];
        for (level, points) in expected {
            assert_eq!(apply_violation(100, level), points, "{level}");
        }
    }

    #[test]
    fn score_never_goes_below_zero() {
        assert_eq!(apply_violation(20, ViolationLevel::Severe), 0);
        assert_eq!(apply_violation(0, ViolationLevel::Warning), 0);
    }

    #[test]
    fn two_high_violations_block_selling_and_buying() {
        let after_first = apply_violation(100, ViolationLevel::High);
        assert_eq!(after_first, 70);
        assert_eq!(
            Eligibility::of(after_first, false),
            Eligibility {
                can_sell: true,
                can_buy: true
            }
        );

        let after_second = apply_violation(after_first, ViolationLevel::High);
        assert_eq!(after_second, 40);
        let eligibility = Eligibility::of(after_second, false);
        assert!(!eligibility.can_sell);
        // 경계는 초과(>) 비교
        assert!(!eligibility.can_buy);
        assert!(Eligibility::of(41, false).can_buy);
        assert!(!Eligibility::of(60, false).can_sell);
        assert!(Eligibility::of(61, false).can_sell);
    }

    #[test]
    fn suspension_blocks_everything() {
        assert_eq!(
            Eligibility::of(100, true),
            Eligibility {
                can_sell: false,
                can_buy: false
            }
        );
    }

    #[test]
    fn monthly_recovery_caps_at_max() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(apply_monthly_recovery(40, None, now), Some(50));
        assert_eq!(apply_monthly_recovery(95, None, now), Some(100));
    }

    #[test]
    fn monthly_recovery_runs_once_per_calendar_month() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 23, 0, 0).unwrap();
        let earlier_this_month = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2024, 4, 30, 23, 59, 59).unwrap();
        let same_month_last_year = Utc.with_ymd_and_hms(2023, 5, 15, 0, 0, 0).unwrap();

        assert_eq!(apply_monthly_recovery(50, Some(earlier_this_month), now), None);
        assert_eq!(apply_monthly_recovery(50, Some(last_month), now), Some(60));
        assert_eq!(
            apply_monthly_recovery(50, Some(same_month_last_year), now),
            Some(60)
        );
    }

    #[test]
    fn suspension_terms_grow_with_level() {
        assert_eq!(ViolationLevel::Warning.suspension(), SuspensionTerm::None);
        assert_eq!(
            ViolationLevel::High.suspension(),
            SuspensionTerm::For(Duration::days(7))
        );
        assert_eq!(
            ViolationLevel::Permanent.suspension(),
            SuspensionTerm::Permanent
        );
    }
}
