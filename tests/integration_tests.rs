use chrono::{DateTime, Duration, TimeZone, Utc};
use marketplace_service::auction::lifecycle::close_expired_auctions;
use marketplace_service::clock::{Clock, ManualClock};
use marketplace_service::database::memory::MemoryStore;
use marketplace_service::handlers;
use marketplace_service::state::AppState;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// 트레이싱 초기화 (테스트마다 호출되므로 두 번째부터는 무시)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

struct TestApp {
    base: String,
    client: Client,
    store: Arc<MemoryStore>,
    clock: ManualClock,
}

/// 임시 포트에 서버 실행
async fn spawn_app() -> TestApp {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    let state = AppState::new(store.clone(), Arc::new(clock.clone()));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("리스너 생성 실패");
    let addr = listener.local_addr().expect("주소 조회 실패");
    tokio::spawn(async move {
        axum::serve(listener, handlers::routes(state).into_make_service())
            .await
            .expect("서버 실행 실패");
    });

    TestApp {
        base: format!("http://{addr}"),
        client: Client::new(),
        store,
        clock,
    }
}

impl TestApp {
    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn register(&self, name: &str, role: &str) -> i64 {
        let (status, body) = self
            .post(
                "/users",
                json!({
                    "display_name": name,
                    "email": format!("{name}@example.com"),
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, 201, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// 승인까지 마친 경매 생성
    async fn active_auction(
        &self,
        seller_id: i64,
        moderator_id: i64,
        starting_price: i64,
        bid_increment: i64,
        buy_now_price: Option<i64>,
    ) -> i64 {
        let start = self.clock.now();
        let auction_id = self
            .create_auction(
                seller_id,
                start,
                start + Duration::hours(24),
                starting_price,
                bid_increment,
                buy_now_price,
            )
            .await;
        let (status, body) = self
            .post(
                &format!("/admin/auctions/{auction_id}/approve"),
                json!({ "moderator_id": moderator_id }),
            )
            .await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["status"], "ACTIVE");
        auction_id
    }

    async fn create_auction(
        &self,
        seller_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        starting_price: i64,
        bid_increment: i64,
        buy_now_price: Option<i64>,
    ) -> i64 {
        let (status, body) = self
            .post(
                "/auctions",
                json!({
                    "seller_id": seller_id,
                    "title": "빈티지 카메라",
                    "description": "필름 카메라입니다.",
                    "starting_price": starting_price,
                    "bid_increment": bid_increment,
                    "buy_now_price": buy_now_price,
                    "start_time": start,
                    "end_time": end,
                }),
            )
            .await;
        assert_eq!(status, 201, "{body}");
        assert_eq!(body["status"], "PENDING");
        body["id"].as_i64().unwrap()
    }

    async fn bid(&self, auction_id: i64, bidder_id: i64, amount: i64) -> (u16, Value) {
        self.post(
            "/bid",
            json!({
                "auction_id": auction_id,
                "bidder_id": bidder_id,
                "bid_amount": amount,
            }),
        )
        .await
    }

    async fn notification_kinds(&self, user_id: i64) -> Vec<String> {
        let (status, body) = self.get(&format!("/users/{user_id}/notifications")).await;
        assert_eq!(status, 200, "{body}");
        body.as_array()
            .unwrap()
            .iter()
            .map(|n| n["kind"].as_str().unwrap().to_string())
            .collect()
    }
}

/// 입찰 테스트
#[tokio::test]
async fn test_place_bid() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let bidder = app.register("bidder", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let auction_id = app
        .active_auction(seller, moderator, 100_000, 10_000, None)
        .await;

    // 현재가보다 낮은 입찰
    let (status, body) = app.bid(auction_id, bidder, 95_000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "LOW_BID");
    assert_eq!(body["minimum"], 110_000);

    // 현재가 + 입찰 단위
    let (status, body) = app.bid(auction_id, bidder, 110_000).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["current_price"], 110_000);

    let (_, auction) = app.get(&format!("/auction/{auction_id}")).await;
    assert_eq!(auction["current_bid"], 110_000);
    assert_eq!(auction["bid_count"], 1);
    assert_eq!(auction["phase"], "ACTIVE");
    assert_eq!(auction["minimum_bid"], 120_000);

    let (_, highest) = app.get(&format!("/auction/{auction_id}/highest-bid")).await;
    assert_eq!(highest["amount"], 110_000);
    assert_eq!(highest["bidder_id"], bidder);

    let (_, history) = app.get(&format!("/auction/{auction_id}/bids")).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // 판매자는 자신의 경매에 입찰 불가
    let (status, body) = app.bid(auction_id, seller, 200_000).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");
}

/// 같은 금액의 동시 입찰은 하나만 반영
#[tokio::test]
async fn test_concurrent_equal_bids() {
    let app = Arc::new(spawn_app().await);
    let seller = app.register("seller", "USER").await;
    let a = app.register("alice", "USER").await;
    let b = app.register("bob", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let auction_id = app.active_auction(seller, moderator, 100, 10, None).await;

    let first = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.bid(auction_id, a, 150).await })
    };
    let second = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.bid(auction_id, b, 150).await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    let accepted = results.iter().filter(|(status, _)| *status == 200).count();
    assert_eq!(accepted, 1);
    let rejected: Vec<_> = results.iter().filter(|(status, _)| *status != 200).collect();
    assert_eq!(rejected[0].1["code"], "LOW_BID");

    let (_, auction) = app.get(&format!("/auction/{auction_id}")).await;
    assert_eq!(auction["current_bid"], 150);
    assert_eq!(auction["bid_count"], 1);
}

/// 동시성 입찰 테스트
#[tokio::test]
async fn test_concurrent_bids() {
    let app = Arc::new(spawn_app().await);
    let seller = app.register("seller", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let mut bidders = Vec::new();
    for i in 0..5 {
        bidders.push(app.register(&format!("bidder{i}"), "USER").await);
    }
    let auction_id = app.active_auction(seller, moderator, 100, 10, None).await;

    let mut handles = Vec::new();
    for i in 1..=50_i64 {
        let app = Arc::clone(&app);
        let bidder = bidders[(i % 5) as usize];
        handles.push(tokio::spawn(async move {
            app.bid(auction_id, bidder, 100 + i * 10).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            200 => accepted += 1,
            _ => assert_eq!(body["code"], "LOW_BID", "{body}"),
        }
    }

    let (_, auction) = app.get(&format!("/auction/{auction_id}")).await;
    assert_eq!(auction["current_bid"], 600);
    assert_eq!(auction["bid_count"], accepted);

    let (_, history) = app.get(&format!("/auction/{auction_id}/bids")).await;
    let amounts: Vec<i64> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["amount"].as_i64().unwrap())
        .collect();
    assert_eq!(amounts.len() as i64, accepted);
    assert!(amounts.windows(2).all(|w| w[0] > w[1]));
}

/// 즉시 구매 테스트
#[tokio::test]
async fn test_buy_now() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let buyer = app.register("buyer", "USER").await;
    let other = app.register("other", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let auction_id = app
        .active_auction(seller, moderator, 10_000, 1_000, Some(50_000))
        .await;

    let (status, _) = app.bid(auction_id, other, 12_000).await;
    assert_eq!(status, 200);

    let (status, body) = app
        .post(
            "/buy-now",
            json!({ "auction_id": auction_id, "buyer_id": buyer }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["price"], 50_000);
    assert_eq!(body["auction"]["status"], "ENDED");
    assert_eq!(body["auction"]["phase"], "ENDED");

    let (status, body) = app.bid(auction_id, other, 60_000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "ALREADY_ENDED");

    assert_eq!(app.notification_kinds(buyer).await, vec!["AUCTION_WON"]);
    assert_eq!(app.notification_kinds(other).await, vec!["OUTBID"]);
    assert_eq!(
        app.notification_kinds(seller).await,
        vec!["AUCTION_ENDED", "AUCTION_APPROVED"]
    );
}

/// 경매 시간 검증
#[tokio::test]
async fn test_auction_time_window() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let bidder = app.register("bidder", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;

    // 승인 전
    let now = app.clock.now();
    let pending = app
        .create_auction(seller, now, now + Duration::hours(1), 1_000, 100, None)
        .await;
    let (status, body) = app.bid(pending, bidder, 2_000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_STATUS");

    // 시작 전
    let later = app
        .create_auction(
            seller,
            now + Duration::hours(1),
            now + Duration::hours(2),
            1_000,
            100,
            None,
        )
        .await;
    app.post(
        &format!("/admin/auctions/{later}/approve"),
        json!({ "moderator_id": moderator }),
    )
    .await;
    let (_, view) = app.get(&format!("/auction/{later}")).await;
    assert_eq!(view["phase"], "NOT_STARTED");
    let (status, body) = app.bid(later, bidder, 2_000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "NOT_STARTED");
}

/// 종료 시각 이후 경매 종료
#[tokio::test]
async fn test_auction_closes_after_end_time() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let bidder = app.register("bidder", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let auction_id = app.active_auction(seller, moderator, 1_000, 100, None).await;

    let (status, _) = app.bid(auction_id, bidder, 1_500).await;
    assert_eq!(status, 200);

    app.clock.advance(Duration::hours(24) + Duration::seconds(1));

    // 스케줄러 실행 전에도 조회 결과는 종료
    let (_, view) = app.get(&format!("/auction/{auction_id}")).await;
    assert_eq!(view["status"], "ACTIVE");
    assert_eq!(view["phase"], "ENDED");
    let (status, body) = app.bid(auction_id, bidder, 2_000).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "ALREADY_ENDED");

    let closed = close_expired_auctions(app.store.as_ref(), &app.clock)
        .await
        .unwrap();
    assert_eq!(closed, 1);

    let (_, view) = app.get(&format!("/auction/{auction_id}")).await;
    assert_eq!(view["status"], "ENDED");
    assert_eq!(view["current_bid"], 1_500);
    assert_eq!(app.notification_kinds(bidder).await, vec!["AUCTION_WON"]);
}

/// 상품 관리 알림
#[tokio::test]
async fn test_product_moderation() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let stranger = app.register("stranger", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;

    let (status, product) = app
        .post(
            "/products",
            json!({
                "seller_id": seller,
                "title": "중고 자전거",
                "price": 150_000,
                "media_urls": ["https://media.example.com/bike.jpg"],
            }),
        )
        .await;
    assert_eq!(status, 201, "{product}");
    assert_eq!(product["status"], "PENDING");
    let product_id = product["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            &format!("/admin/products/{product_id}/approve"),
            json!({ "moderator_id": stranger }),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app
        .post(
            &format!("/admin/products/{product_id}/approve"),
            json!({ "moderator_id": moderator }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "ACTIVE");

    // 다시 승인해도 알림은 한 번만
    let (status, body) = app
        .post(
            &format!("/admin/products/{product_id}/approve"),
            json!({ "moderator_id": moderator }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_STATUS");

    let (_, active) = app.get("/products?status=ACTIVE").await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let (status, body) = app.get("/products?status=SOLD").await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION");

    let (status, _) = app
        .post(
            &format!("/products/{product_id}/delete"),
            json!({ "actor_id": moderator }),
        )
        .await;
    assert_eq!(status, 204);
    let (status, _) = app.get(&format!("/products/{product_id}")).await;
    assert_eq!(status, 404);

    assert_eq!(
        app.notification_kinds(seller).await,
        vec!["PRODUCT_DELETED", "PRODUCT_APPROVED"]
    );
}

/// 신고 처리와 신뢰도
#[tokio::test]
async fn test_report_resolution_updates_trust() {
    let app = spawn_app().await;
    let reporter = app.register("reporter", "USER").await;
    let reported = app.register("reported", "USER").await;
    let seller = app.register("seller", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let admin = app.register("admin", "ADMIN").await;
    let auction_id = app.active_auction(seller, moderator, 1_000, 100, None).await;

    for _ in 0..2 {
        let (status, report) = app
            .post(
                "/reports",
                json!({
                    "reporter_id": reporter,
                    "reported_user_id": reported,
                    "level": "HIGH",
                    "reason": "허위 매물",
                }),
            )
            .await;
        assert_eq!(status, 201, "{report}");
        let report_id = report["id"].as_i64().unwrap();

        let (status, resolved) = app
            .post(
                &format!("/admin/reports/{report_id}/resolve"),
                json!({ "moderator_id": moderator, "note": "확인됨" }),
            )
            .await;
        assert_eq!(status, 403, "{resolved}");
        assert_eq!(resolved["code"], "FORBIDDEN");

        let (status, resolved) = app
            .post(
                &format!("/admin/reports/{report_id}/resolve"),
                json!({ "moderator_id": admin, "note": "확인됨" }),
            )
            .await;
        assert_eq!(status, 200, "{resolved}");
        assert_eq!(resolved["status"], "RESOLVED");
    }

    let (_, user) = app.get(&format!("/users/{reported}")).await;
    assert_eq!(user["trust_score"], 40);
    assert_eq!(user["eligibility"]["can_sell"], false);
    assert_eq!(user["eligibility"]["can_buy"], false);

    let (status, body) = app.bid(auction_id, reported, 2_000).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "INELIGIBLE");

    let (_, open) = app.get("/admin/reports?status=PENDING").await;
    assert!(open.as_array().unwrap().is_empty());

    // 정지가 끝나도 점수 40 은 구매 불가
    app.clock.advance(Duration::days(8));
    let (_, user) = app.get(&format!("/users/{reported}")).await;
    assert_eq!(user["suspended_now"], false);
    assert_eq!(user["eligibility"]["can_buy"], false);

    assert_eq!(
        app.notification_kinds(reporter).await,
        vec!["REPORT_RESOLVED", "REPORT_RESOLVED"]
    );
}

/// 관리자 정지와 해제
#[tokio::test]
async fn test_suspend_and_unsuspend() {
    let app = spawn_app().await;
    let admin = app.register("admin", "ADMIN").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    let user = app.register("user", "USER").await;

    let (status, _) = app
        .post(
            &format!("/admin/users/{user}/suspend"),
            json!({ "admin_id": moderator, "level": "MEDIUM", "reason": "도배" }),
        )
        .await;
    assert_eq!(status, 403);

    let (status, body) = app
        .post(
            &format!("/admin/users/{user}/suspend"),
            json!({ "admin_id": admin, "level": "MEDIUM", "reason": "도배" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["trust_score"], 80);
    assert_eq!(body["suspended_now"], true);

    let (status, body) = app
        .post(
            &format!("/admin/users/{user}/unsuspend"),
            json!({ "admin_id": admin }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["suspended"], false);
    assert_eq!(body["eligibility"]["can_sell"], true);

    assert_eq!(
        app.notification_kinds(user).await,
        vec!["SUSPENSION_LIFTED", "ACCOUNT_SUSPENDED"]
    );
}

/// 알림 읽음 처리
#[tokio::test]
async fn test_mark_notification_read() {
    let app = spawn_app().await;
    let seller = app.register("seller", "USER").await;
    let other = app.register("other", "USER").await;
    let moderator = app.register("moderator", "MODERATOR").await;
    app.active_auction(seller, moderator, 1_000, 100, None).await;

    let (_, inbox) = app.get(&format!("/users/{seller}/notifications")).await;
    let notification_id = inbox[0]["id"].as_i64().unwrap();
    assert_eq!(inbox[0]["read"], false);

    let (status, _) = app
        .post(
            &format!("/notifications/{notification_id}/read"),
            json!({ "user_id": other }),
        )
        .await;
    assert_eq!(status, 404);

    let (status, body) = app
        .post(
            &format!("/notifications/{notification_id}/read"),
            json!({ "user_id": seller }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["read"], true);
}

/// 잘못된 요청도 JSON 에러 본문으로 응답
#[tokio::test]
async fn test_malformed_requests() {
    let app = spawn_app().await;
    let reporter = app.register("reporter", "USER").await;
    let reported = app.register("reported", "USER").await;

    let (status, body) = app
        .post(
            "/reports",
            json!({
                "reporter_id": reporter,
                "reported_user_id": reported,
                "level": "BOGUS",
                "reason": "허위 매물",
            }),
        )
        .await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["code"], "VALIDATION");
    assert!(body["error"].is_string());

    let (status, body) = app.post("/bid", json!({ "auction_id": 1 })).await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = app.get("/auction/abc").await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["code"], "VALIDATION");
}
