// region:    --- Imports
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::NewNotification;
use crate::users::require_user;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Model
text_enum! {
    pub enum ProductStatus {
        /// 관리자 승인 대기
        Pending => "PENDING",
        Active => "ACTIVE",
        Rejected => "REJECTED",
    }
}

// 일반 판매 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    #[sqlx(try_from = "String")]
    pub status: ProductStatus,
    pub media_urls: Vec<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 상품 등록 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// 상품 상태 전이 (현재 상태가 `from` 일 때만 적용)
#[derive(Debug, Clone)]
pub struct ProductTransition {
    pub product_id: i64,
    pub from: ProductStatus,
    pub to: ProductStatus,
    pub rejection_reason: Option<String>,
    pub notifications: Vec<NewNotification>,
    pub at: DateTime<Utc>,
}
// endregion: --- Model

// region:    --- Commands
/// 상품 등록 (승인 대기 상태로 생성)
pub async fn create_product(
    store: &dyn Store,
    clock: &dyn Clock,
    new: NewProduct,
) -> MarketResult<Product> {
    info!(
        "{:<12} --> 상품 등록 요청 seller: {}, price: {}",
        "Product", new.seller_id, new.price
    );
    if new.title.trim().is_empty() {
        return Err(MarketError::Validation("상품명이 비어 있습니다.".to_string()));
    }
    if new.price <= 0 {
        return Err(MarketError::Validation(format!(
            "가격은 0보다 커야 합니다: {}",
            new.price
        )));
    }

    let now = clock.now();
    let seller = require_user(store, new.seller_id).await?;
    if !seller.eligibility(now).can_sell {
        return Err(MarketError::Ineligible(format!(
            "사용자 {}는 판매할 수 없습니다. (신뢰도: {})",
            seller.id, seller.trust_score
        )));
    }

    store.insert_product(new, now).await
}

/// 상품 조회
pub async fn get_product(store: &dyn Store, product_id: i64) -> MarketResult<Product> {
    store
        .product(product_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("상품 {product_id}")))
}

/// 상품 목록 조회
pub async fn list_products(
    store: &dyn Store,
    status: Option<ProductStatus>,
) -> MarketResult<Vec<Product>> {
    info!("{:<12} --> 상품 목록 조회 status: {:?}", "Product", status);
    store.products(status).await
}
// endregion: --- Commands
