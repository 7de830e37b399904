// region:    --- Users
/// 사용자 등록
pub const INSERT_USER: &str = r#"
    INSERT INTO users (display_name, email, role, trust_score, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING *
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT * FROM users WHERE id = $1";

/// 사용자 조건부 갱신 (version 일치 시)
pub const UPDATE_USER_IF_VERSION: &str = r#"
    UPDATE users
    SET trust_score = $3, suspended = $4, suspension_reason = $5,
        suspended_until = $6, last_recovery_at = $7, version = version + 1
    WHERE id = $1 AND version = $2
    RETURNING *
"#;

/// 정지 기간이 끝난 사용자
pub const GET_USERS_WITH_EXPIRED_SUSPENSION: &str = r#"
    SELECT * FROM users
    WHERE suspended AND suspended_until IS NOT NULL AND suspended_until <= $1
"#;

/// 월간 회복 대상 사용자
pub const GET_USERS_DUE_RECOVERY: &str = r#"
    SELECT * FROM users
    WHERE trust_score < 100
      AND NOT (suspended AND suspended_until IS NULL)
      AND (last_recovery_at IS NULL OR last_recovery_at < $1)
"#;
// endregion: --- Users

// region:    --- Auctions
/// 경매 등록 (승인 대기)
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (seller_id, title, description, starting_price, current_bid,
                          bid_increment, buy_now_price, start_time, end_time, status,
                          created_at, updated_at)
    VALUES ($1, $2, $3, $4, $4, $5, $6, $7, $8, $9, $10, $10)
    RETURNING *
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = "SELECT * FROM auctions ORDER BY id DESC";

/// 종료 시각이 지난 진행 중 경매
pub const GET_AUCTIONS_DUE_TO_END: &str =
    "SELECT * FROM auctions WHERE status = 'ACTIVE' AND end_time < $1 ORDER BY end_time";

/// 경매 조건부 갱신 (version 일치 시)
pub const UPDATE_AUCTION_IF_VERSION: &str = r#"
    UPDATE auctions
    SET current_bid = $3, bid_count = $4, highest_bidder_id = $5, status = $6,
        version = version + 1, updated_at = $7
    WHERE id = $1 AND version = $2
    RETURNING *
"#;

/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, sequence, placed_at)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 입찰 이력 조회
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, amount, sequence, placed_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY sequence DESC
"#;
// endregion: --- Auctions

// region:    --- Events
/// 이벤트 추가
pub const INSERT_EVENT: &str = r#"
    INSERT INTO events (aggregate_id, event_type, data, timestamp, version)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 경매 이벤트 조회
pub const GET_EVENTS: &str = "SELECT * FROM events WHERE aggregate_id = $1 ORDER BY version";

/// 미발행 이벤트 조회
pub const GET_UNPUBLISHED_EVENTS: &str =
    "SELECT * FROM events WHERE published_at IS NULL ORDER BY id LIMIT $1";

/// 이벤트 발행 표시
pub const MARK_EVENT_PUBLISHED: &str = "UPDATE events SET published_at = $2 WHERE id = $1";
// endregion: --- Events

// region:    --- Products
/// 상품 등록 (승인 대기)
pub const INSERT_PRODUCT: &str = r#"
    INSERT INTO products (seller_id, title, description, price, status, media_urls,
                          created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
    RETURNING *
"#;

/// 상품 조회
pub const GET_PRODUCT: &str = "SELECT * FROM products WHERE id = $1";

/// 모든 상품 조회
pub const GET_ALL_PRODUCTS: &str = "SELECT * FROM products ORDER BY id DESC";

/// 상태별 상품 조회
pub const GET_PRODUCTS_BY_STATUS: &str =
    "SELECT * FROM products WHERE status = $1 ORDER BY id DESC";

/// 상품 상태 전이 (현재 상태 일치 시)
pub const UPDATE_PRODUCT_STATUS: &str = r#"
    UPDATE products
    SET status = $3, rejection_reason = $4, updated_at = $5
    WHERE id = $1 AND status = $2
    RETURNING *
"#;

/// 상품 삭제
pub const DELETE_PRODUCT: &str = "DELETE FROM products WHERE id = $1";
// endregion: --- Products

// region:    --- Reports
/// 신고 접수
pub const INSERT_REPORT: &str = r#"
    INSERT INTO reports (reporter_id, reported_user_id, level, reason, evidence_urls,
                         status, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING *
"#;

/// 신고 조회
pub const GET_REPORT: &str = "SELECT * FROM reports WHERE id = $1";

/// 모든 신고 조회
pub const GET_ALL_REPORTS: &str = "SELECT * FROM reports ORDER BY id DESC";

/// 상태별 신고 조회
pub const GET_REPORTS_BY_STATUS: &str = "SELECT * FROM reports WHERE status = $1 ORDER BY id DESC";

/// 신고 처리 (현재 상태가 목록 중 하나일 때)
pub const UPDATE_REPORT_STATUS: &str = r#"
    UPDATE reports
    SET status = $3, reviewer_id = $4, resolution_note = COALESCE($5, resolution_note),
        resolved_at = $6
    WHERE id = $1 AND status = ANY($2)
    RETURNING *
"#;
// endregion: --- Reports

// region:    --- Notifications
/// 알림 추가
pub const INSERT_NOTIFICATION: &str = r#"
    INSERT INTO notifications (user_id, kind, title, body, reference_id, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// 사용자 알림 조회
pub const GET_USER_NOTIFICATIONS: &str =
    "SELECT * FROM notifications WHERE user_id = $1 ORDER BY id DESC";

/// 알림 읽음 처리
pub const MARK_NOTIFICATION_READ: &str =
    "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *";

/// 미발행 알림 조회
pub const GET_UNPUBLISHED_NOTIFICATIONS: &str =
    "SELECT * FROM notifications WHERE published_at IS NULL ORDER BY id LIMIT $1";

/// 알림 발행 표시
pub const MARK_NOTIFICATION_PUBLISHED: &str =
    "UPDATE notifications SET published_at = $2 WHERE id = $1";
// endregion: --- Notifications
