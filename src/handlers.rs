// region:    --- Imports
use crate::auction::lifecycle;
use crate::bidding::commands::{self, BuyNowCommand, PlaceBidCommand};
use crate::bidding::model::NewAuction;
use crate::error::{MarketError, MarketResult};
use crate::moderation;
use crate::notifications;
use crate::products::{self, NewProduct, ProductStatus};
use crate::query::{self, AuctionView};
use crate::reports::{self, NewReport, ReportStatus};
use crate::state::AppState;
use crate::trust::ViolationLevel;
use crate::users::{self, NewUser, UserView};
use axum::extract::{DefaultBodyLimit, FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router
pub fn routes(state: AppState) -> Router {
    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/users", post(handle_register_user))
        .route("/users/:id", get(handle_get_user))
        .route("/users/:id/notifications", get(handle_get_notifications))
        .route("/notifications/:id/read", post(handle_mark_notification_read))
        .route("/auctions", post(handle_create_auction).get(handle_get_auctions))
        .route("/auction/:id", get(handle_get_auction_state))
        .route("/auction/:id/highest-bid", get(handle_get_highest_bid))
        .route("/auction/:id/bids", get(handle_get_bid_history))
        .route("/bid", post(handle_bid))
        .route("/buy-now", post(handle_buy_now))
        .route("/products", post(handle_create_product).get(handle_get_products))
        .route("/products/:id", get(handle_get_product))
        .route("/products/:id/delete", post(handle_delete_product))
        .route("/reports", post(handle_submit_report))
        .route("/admin/reports", get(handle_get_reports))
        .route("/admin/reports/:id/review", post(handle_review_report))
        .route("/admin/reports/:id/resolve", post(handle_resolve_report))
        .route("/admin/reports/:id/reject", post(handle_reject_report))
        .route("/admin/products/:id/approve", post(handle_approve_product))
        .route("/admin/products/:id/reject", post(handle_reject_product))
        .route("/admin/auctions/:id/approve", post(handle_approve_auction))
        .route("/admin/users/:id/suspend", post(handle_suspend_user))
        .route("/admin/users/:id/unsuspend", post(handle_unsuspend_user))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 동시 입찰 요청을 위한 바디 사이즈 (20MB)
        .with_state(state)
}
// endregion: --- Router

// region:    --- Extractors
/// 본문 역직렬화 실패도 `{error, code}` 형식으로 응답한다.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(MarketError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(MarketError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(MarketError))]
pub struct AppQuery<T>(pub T);
// endregion: --- Extractors

// region:    --- Request Bodies
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReaderBody {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ActorBody {
    pub actor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ModeratorBody {
    pub moderator_id: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectProductBody {
    pub moderator_id: i64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct SuspendBody {
    pub admin_id: i64,
    pub level: ViolationLevel,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct UnsuspendBody {
    pub admin_id: i64,
}
// endregion: --- Request Bodies

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<AppState>,
    AppJson(cmd): AppJson<PlaceBidCommand>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Handler", cmd);
    let receipt =
        commands::handle_place_bid(state.store.as_ref(), state.clock.as_ref(), cmd).await?;
    Ok(Json(serde_json::json!({
        "message": "입찰이 성공적으로 처리되었습니다.",
        "current_price": receipt.auction.current_bid,
        "bid_amount": receipt.accepted_amount,
        "buy_now": receipt.buy_now,
        "auction": AuctionView::at(receipt.auction, state.clock.now()),
    })))
}

/// 즉시 구매 요청 처리
pub async fn handle_buy_now(
    State(state): State<AppState>,
    AppJson(cmd): AppJson<BuyNowCommand>,
) -> MarketResult<impl IntoResponse> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Handler", cmd);
    let receipt = commands::handle_buy_now(state.store.as_ref(), state.clock.as_ref(), cmd).await?;
    Ok(Json(serde_json::json!({
        "message": "즉시 구매가 성공적으로 처리되었습니다.",
        "price": receipt.accepted_amount,
        "auction": AuctionView::at(receipt.auction, state.clock.now()),
    })))
}

/// 가입
pub async fn handle_register_user(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewUser>,
) -> MarketResult<impl IntoResponse> {
    let user = users::register_user(state.store.as_ref(), state.clock.as_ref(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserView::at(user, state.clock.now())),
    ))
}

/// 경매 등록
pub async fn handle_create_auction(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewAuction>,
) -> MarketResult<impl IntoResponse> {
    let auction =
        lifecycle::create_auction(state.store.as_ref(), state.clock.as_ref(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuctionView::at(auction, state.clock.now())),
    ))
}

/// 상품 등록
pub async fn handle_create_product(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewProduct>,
) -> MarketResult<impl IntoResponse> {
    let product =
        products::create_product(state.store.as_ref(), state.clock.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// 상품 삭제
pub async fn handle_delete_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i64>,
    AppJson(body): AppJson<ActorBody>,
) -> MarketResult<impl IntoResponse> {
    moderation::delete_product(
        state.store.as_ref(),
        state.clock.as_ref(),
        product_id,
        body.actor_id,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 신고 접수
pub async fn handle_submit_report(
    State(state): State<AppState>,
    AppJson(new): AppJson<NewReport>,
) -> MarketResult<impl IntoResponse> {
    let report = reports::submit_report(state.store.as_ref(), state.clock.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// 알림 읽음 처리
pub async fn handle_mark_notification_read(
    State(state): State<AppState>,
    AppPath(notification_id): AppPath<i64>,
    AppJson(body): AppJson<ReaderBody>,
) -> MarketResult<impl IntoResponse> {
    let notification =
        notifications::mark_notification_read(state.store.as_ref(), notification_id, body.user_id)
            .await?;
    Ok(Json(notification))
}

// endregion: --- Command Handlers

// region:    --- Moderation Handlers

pub async fn handle_approve_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i64>,
    AppJson(body): AppJson<ModeratorBody>,
) -> MarketResult<impl IntoResponse> {
    let product = moderation::approve_product(
        state.store.as_ref(),
        state.clock.as_ref(),
        product_id,
        body.moderator_id,
    )
    .await?;
    Ok(Json(product))
}

pub async fn handle_reject_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i64>,
    AppJson(body): AppJson<RejectProductBody>,
) -> MarketResult<impl IntoResponse> {
    let product = moderation::reject_product(
        state.store.as_ref(),
        state.clock.as_ref(),
        product_id,
        body.moderator_id,
        body.reason,
    )
    .await?;
    Ok(Json(product))
}

pub async fn handle_approve_auction(
    State(state): State<AppState>,
    AppPath(auction_id): AppPath<i64>,
    AppJson(body): AppJson<ModeratorBody>,
) -> MarketResult<impl IntoResponse> {
    let auction = moderation::approve_auction(
        state.store.as_ref(),
        state.clock.as_ref(),
        auction_id,
        body.moderator_id,
    )
    .await?;
    Ok(Json(AuctionView::at(auction, state.clock.now())))
}

pub async fn handle_review_report(
    State(state): State<AppState>,
    AppPath(report_id): AppPath<i64>,
    AppJson(body): AppJson<ModeratorBody>,
) -> MarketResult<impl IntoResponse> {
    let report = moderation::review_report(
        state.store.as_ref(),
        state.clock.as_ref(),
        report_id,
        body.moderator_id,
        body.note,
    )
    .await?;
    Ok(Json(report))
}

pub async fn handle_resolve_report(
    State(state): State<AppState>,
    AppPath(report_id): AppPath<i64>,
    AppJson(body): AppJson<ModeratorBody>,
) -> MarketResult<impl IntoResponse> {
    let report = moderation::resolve_report(
        state.store.as_ref(),
        state.clock.as_ref(),
        report_id,
        body.moderator_id,
        body.note,
    )
    .await?;
    Ok(Json(report))
}

pub async fn handle_reject_report(
    State(state): State<AppState>,
    AppPath(report_id): AppPath<i64>,
    AppJson(body): AppJson<ModeratorBody>,
) -> MarketResult<impl IntoResponse> {
    let report = moderation::reject_report(
        state.store.as_ref(),
        state.clock.as_ref(),
        report_id,
        body.moderator_id,
        body.note,
    )
    .await?;
    Ok(Json(report))
}

pub async fn handle_suspend_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
    AppJson(body): AppJson<SuspendBody>,
) -> MarketResult<impl IntoResponse> {
    let user = moderation::suspend_user(
        state.store.as_ref(),
        state.clock.as_ref(),
        user_id,
        body.admin_id,
        body.level,
        body.reason,
    )
    .await?;
    Ok(Json(UserView::at(user, state.clock.now())))
}

pub async fn handle_unsuspend_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
    AppJson(body): AppJson<UnsuspendBody>,
) -> MarketResult<impl IntoResponse> {
    let user = moderation::unsuspend_user(
        state.store.as_ref(),
        state.clock.as_ref(),
        user_id,
        body.admin_id,
    )
    .await?;
    Ok(Json(UserView::at(user, state.clock.now())))
}

// endregion: --- Moderation Handlers

// region:    --- Query Handlers

/// 경매 상태 조회
pub async fn handle_get_auction_state(
    State(state): State<AppState>,
    AppPath(auction_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let view =
        query::handlers::get_auction_state(state.store.as_ref(), state.clock.as_ref(), auction_id)
            .await?;
    Ok(Json(view))
}

/// 모든 경매 조회
pub async fn handle_get_auctions(State(state): State<AppState>) -> MarketResult<impl IntoResponse> {
    let views =
        query::handlers::get_all_auctions(state.store.as_ref(), state.clock.as_ref()).await?;
    Ok(Json(views))
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State(state): State<AppState>,
    AppPath(auction_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let highest = query::handlers::get_highest_bid(state.store.as_ref(), auction_id).await?;
    Ok(Json(highest))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    AppPath(auction_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let history = query::handlers::get_bid_history(state.store.as_ref(), auction_id).await?;
    Ok(Json(history))
}

/// 사용자 조회
pub async fn handle_get_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let view =
        query::handlers::get_user(state.store.as_ref(), state.clock.as_ref(), user_id).await?;
    Ok(Json(view))
}

/// 사용자 알림 조회
pub async fn handle_get_notifications(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let list = notifications::list_notifications(state.store.as_ref(), user_id).await?;
    Ok(Json(list))
}

/// 상품 목록 조회
pub async fn handle_get_products(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> MarketResult<impl IntoResponse> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<ProductStatus>)
        .transpose()?;
    let list = products::list_products(state.store.as_ref(), status).await?;
    Ok(Json(list))
}

/// 상품 조회
pub async fn handle_get_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i64>,
) -> MarketResult<impl IntoResponse> {
    let product = products::get_product(state.store.as_ref(), product_id).await?;
    Ok(Json(product))
}

/// 신고 목록 조회
pub async fn handle_get_reports(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> MarketResult<impl IntoResponse> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<ReportStatus>)
        .transpose()?;
    let list = reports::list_reports(state.store.as_ref(), status).await?;
    Ok(Json(list))
}

// endregion: --- Query Handlers
