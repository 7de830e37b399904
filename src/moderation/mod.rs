/// 관리 워크플로
/// 모든 관리 조치는 상태 변경과 알림 기록을 저장소 메서드 하나(한 트랜잭션)로 처리한다.
/// 이미 처리된 조치를 다시 요청하면 INVALID_STATUS 로 거절되어 알림이 중복되지 않는다.
// region:    --- Modules
mod listings;
mod reports;
mod sanctions;

pub use listings::{approve_auction, approve_product, delete_product, reject_product};
pub use reports::{reject_report, resolve_report, review_report};
pub use sanctions::{
    lift_expired_suspensions, recover_trust_scores, sanction, suspend_user, unsuspend_user,
};

// endregion: --- Modules

/// 사용자 조건부 갱신 최대 재시도 횟수
const MAX_RETRIES: u32 = 20;
