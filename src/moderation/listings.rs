// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::status::AuctionStatus;
use crate::bidding::model::{Auction, AuctionMutation};
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::{NewNotification, NotificationKind};
use crate::products::{get_product, Product, ProductStatus, ProductTransition};
use crate::users::{require_moderator, require_user};
use tracing::info;

// endregion: --- Imports

// region:    --- Products
/// 상품 승인 (PENDING -> ACTIVE)
pub async fn approve_product(
    store: &dyn Store,
    clock: &dyn Clock,
    product_id: i64,
    moderator_id: i64,
) -> MarketResult<Product> {
    info!(
        "{:<12} --> 상품 승인 id: {}, moderator: {}",
        "Moderation", product_id, moderator_id
    );
    require_moderator(store, moderator_id).await?;
    let product = get_product(store, product_id).await?;

    store
        .transition_product(ProductTransition {
            product_id,
            from: ProductStatus::Pending,
            to: ProductStatus::Active,
            rejection_reason: None,
            notifications: vec![NewNotification::new(
                product.seller_id,
                NotificationKind::ProductApproved,
                "상품 승인",
                format!("'{}' 상품이 승인되었습니다.", product.title),
            )
            .about(product.id)],
            at: clock.now(),
        })
        .await
}

/// 상품 반려 (PENDING -> REJECTED)
pub async fn reject_product(
    store: &dyn Store,
    clock: &dyn Clock,
    product_id: i64,
    moderator_id: i64,
    reason: String,
) -> MarketResult<Product> {
    info!(
        "{:<12} --> 상품 반려 id: {}, moderator: {}",
        "Moderation", product_id, moderator_id
    );
    if reason.trim().is_empty() {
        return Err(MarketError::Validation("반려 사유가 비어 있습니다.".to_string()));
    }
    require_moderator(store, moderator_id).await?;
    let product = get_product(store, product_id).await?;

    store
        .transition_product(ProductTransition {
            product_id,
            from: ProductStatus::Pending,
            to: ProductStatus::Rejected,
            notifications: vec![NewNotification::new(
                product.seller_id,
                NotificationKind::ProductRejected,
                "상품 반려",
                format!("'{}' 상품이 반려되었습니다: {}", product.title, reason),
            )
            .about(product.id)],
            rejection_reason: Some(reason),
            at: clock.now(),
        })
        .await
}

/// 상품 삭제
/// 판매자 본인 또는 모더레이터만 가능하며, 모더레이터가 삭제하면 판매자에게 알린다.
pub async fn delete_product(
    store: &dyn Store,
    clock: &dyn Clock,
    product_id: i64,
    actor_id: i64,
) -> MarketResult<()> {
    info!(
        "{:<12} --> 상품 삭제 id: {}, actor: {}",
        "Moderation", product_id, actor_id
    );
    let actor = require_user(store, actor_id).await?;
    let product = get_product(store, product_id).await?;

    let by_seller = actor.id == product.seller_id;
    if !by_seller && !actor.role.can_moderate() {
        return Err(MarketError::Forbidden(format!(
            "사용자 {actor_id}는 상품 {product_id}를 삭제할 수 없습니다."
        )));
    }

    let notifications = if by_seller {
        Vec::new()
    } else {
        vec![NewNotification::new(
            product.seller_id,
            NotificationKind::ProductDeleted,
            "상품 삭제",
            format!("'{}' 상품이 관리자에 의해 삭제되었습니다.", product.title),
        )
        .about(product.id)]
    };

    if !store
        .delete_product(product_id, notifications, clock.now())
        .await?
    {
        return Err(MarketError::not_found(format!("상품 {product_id}")));
    }
    Ok(())
}
// endregion: --- Products

// region:    --- Auctions
/// 경매 승인 (PENDING -> ACTIVE)
pub async fn approve_auction(
    store: &dyn Store,
    clock: &dyn Clock,
    auction_id: i64,
    moderator_id: i64,
) -> MarketResult<Auction> {
    info!(
        "{:<12} --> 경매 승인 id: {}, moderator: {}",
        "Moderation", auction_id, moderator_id
    );
    require_moderator(store, moderator_id).await?;
    let auction = store
        .auction(auction_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("경매 {auction_id}")))?;

    if auction.status != AuctionStatus::Pending {
        return Err(already_processed(&auction));
    }
    let now = clock.now();
    if now > auction.end_time {
        return Err(MarketError::AlreadyEnded);
    }

    let mut mutation = AuctionMutation::on(
        &auction,
        AuctionEvent::AuctionApproved {
            auction_id,
            moderator_id,
            timestamp: now,
        },
        now,
    );
    mutation.status = AuctionStatus::Active;
    mutation.notifications.push(
        NewNotification::new(
            auction.seller_id,
            NotificationKind::AuctionApproved,
            "경매 승인",
            format!("'{}' 경매가 승인되었습니다.", auction.title),
        )
        .about(auction.id),
    );

    // 승인 대기 중인 경매를 바꾸는 쓰기는 승인뿐이므로 충돌은 동시 승인이다.
    match store.commit_auction(mutation).await {
        Err(MarketError::VersionConflict) => Err(already_processed(&auction)),
        result => result,
    }
}

fn already_processed(auction: &Auction) -> MarketError {
    MarketError::InvalidStatus(format!(
        "경매 {}는 승인 대기 상태가 아닙니다.",
        auction.id
    ))
}
// endregion: --- Auctions
