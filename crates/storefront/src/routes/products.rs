//! Product route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::header,
    response::IntoResponse,
};
use tracing::instrument;

use dharma_core::ProductId;
use dharma_core::api::{
    ProductCountResponse, ProductFilterRequest, ProductListResponse, ProductResponse,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Photos change rarely; let browsers keep them for five minutes.
const PHOTO_CACHE_CONTROL: &str = "public, max-age=300";

/// One page of the listing.
#[instrument(skip(state, page))]
pub async fn list(
    State(state): State<AppState>,
    page: std::result::Result<Path<u32>, PathRejection>,
) -> Result<Json<ProductListResponse>> {
    let Path(page) = page.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let products = state.catalog().page(page).await?;
    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}

/// Total number of products.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Result<Json<ProductCountResponse>> {
    let total = state.catalog().total_count().await?;
    Ok(Json(ProductCountResponse {
        success: true,
        total,
    }))
}

/// Products matching the selected categories and price range.
#[instrument(skip(state, payload))]
pub async fn filter(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProductFilterRequest>, JsonRejection>,
) -> Result<Json<ProductListResponse>> {
    let Json(request) = payload?;
    let products = state.catalog().filter(request).await?;
    Ok(Json(ProductListResponse {
        success: true,
        products,
    }))
}

/// Raw photo bytes with the stored content type.
#[instrument(skip(state, id))]
pub async fn photo(
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let photo = state.catalog().photo(id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, photo.content_type.clone()),
            (header::CACHE_CONTROL, PHOTO_CACHE_CONTROL.to_string()),
        ],
        Bytes::copy_from_slice(&photo.data),
    ))
}

/// A single product by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>> {
    let product = state.catalog().product(&slug).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use dharma_core::api::{CategoryListResponse, ErrorResponse, paths};
    use dharma_core::{CategoryId, Price};

    use crate::config::StorefrontConfig;
    use crate::db::{CatalogStore, MemoryCatalogStore};
    use crate::models::{NewCategory, NewProduct, Photo};
    use crate::routes;
    use crate::state::AppState;

    use super::*;

    struct TestApp {
        router: Router,
        store: Arc<MemoryCatalogStore>,
        electronics: CategoryId,
    }

    fn config(page_size: u32) -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            page_size,
            cors_origin: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// 25 products, alternating Electronics/Hardware, newest is `product-24`.
    async fn test_app() -> TestApp {
        let store = Arc::new(MemoryCatalogStore::new());
        let electronics = store
            .insert_category(NewCategory {
                name: "Electronics".into(),
                slug: "electronics".into(),
            })
            .await
            .unwrap()
            .id;
        let hardware = store
            .insert_category(NewCategory {
                name: "Hardware".into(),
                slug: "hardware".into(),
            })
            .await
            .unwrap()
            .id;

        let base = Utc::now();
        for i in 0..25u32 {
            store
                .insert_product_at(
                    NewProduct {
                        name: format!("Product {i}"),
                        slug: format!("product-{i}"),
                        description: String::new(),
                        price: Price::whole(10 * (i + 1)),
                        category: if i % 2 == 0 { electronics } else { hardware },
                        photo: (i == 3).then(|| Photo::new("image/jpeg", vec![0xFF, 0xD8])),
                    },
                    base + Duration::seconds(i64::from(i)),
                )
                .await
                .unwrap();
        }

        let state = AppState::new(config(10), store.clone());
        TestApp {
            router: routes::routes().with_state(state),
            store,
            electronics,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    async fn get_json<T: DeserializeOwned>(router: &Router, uri: &str) -> (StatusCode, T) {
        let (status, body) = send(
            router,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_filter(router: &Router, body: serde_json::Value) -> (StatusCode, Bytes) {
        send(
            router,
            Request::builder()
                .method("POST")
                .uri(paths::PRODUCT_FILTERS)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    #[tokio::test]
    async fn test_listing_pages_and_count() {
        let app = test_app().await;

        let (status, count): (_, ProductCountResponse) =
            get_json(&app.router, paths::PRODUCT_COUNT).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count.total, 25);

        let mut sizes = Vec::new();
        for page in 1..=3 {
            let (status, list): (_, ProductListResponse) =
                get_json(&app.router, &paths::product_list(page)).await;
            assert_eq!(status, StatusCode::OK);
            assert!(list.success);
            sizes.push(list.products.len());
        }
        assert_eq!(sizes, [10, 10, 5]);

        let (_, first): (_, ProductListResponse) =
            get_json(&app.router, &paths::product_list(1)).await;
        assert_eq!(first.products.first().unwrap().slug, "product-24");
    }

    #[tokio::test]
    async fn test_page_zero_and_garbage_are_bad_requests() {
        let app = test_app().await;

        let (status, err): (_, ErrorResponse) =
            get_json(&app.router, &paths::product_list(0)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!err.success);

        let (status, _): (_, ErrorResponse) =
            get_json(&app.router, "/api/v1/product/product-list/two").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_categories() {
        let app = test_app().await;
        let (status, body): (_, CategoryListResponse) =
            get_json(&app.router, paths::CATEGORIES).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        let names: Vec<_> = body.category.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Electronics", "Hardware"]);
    }

    #[tokio::test]
    async fn test_filter_by_category_replaces_listing() {
        let app = test_app().await;
        let (status, body) = post_filter(
            &app.router,
            serde_json::json!({ "checked": [app.electronics.to_string()], "radio": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let list: ProductListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.products.len(), 13);
        assert!(list.products.iter().all(|p| p.category == app.electronics));
    }

    #[tokio::test]
    async fn test_filter_by_category_and_price() {
        let app = test_app().await;
        let (_, body) = post_filter(
            &app.router,
            serde_json::json!({ "checked": [app.electronics.to_string()], "radio": [20, 59] }),
        )
        .await;
        let list: ProductListResponse = serde_json::from_slice(&body).unwrap();
        let prices: Vec<_> = list.products.iter().map(|p| p.price).collect();
        assert_eq!(prices, [Price::whole(50), Price::whole(30)]);
    }

    #[tokio::test]
    async fn test_empty_filter_matches_first_page() {
        let app = test_app().await;
        let (_, body) =
            post_filter(&app.router, serde_json::json!({ "checked": [], "radio": [] })).await;
        let filtered: ProductListResponse = serde_json::from_slice(&body).unwrap();

        let (_, first): (_, ProductListResponse) =
            get_json(&app.router, &paths::product_list(1)).await;
        assert_eq!(filtered.products, first.products);
    }

    #[tokio::test]
    async fn test_malformed_filter_bodies_are_bad_requests() {
        let app = test_app().await;
        for body in [
            serde_json::json!({ "checked": [], "radio": [10] }),
            serde_json::json!({ "checked": [], "radio": [50, 10] }),
            serde_json::json!({ "checked": [], "radio": [-5, 10] }),
            serde_json::json!({ "checked": ["cat1"], "radio": [] }),
        ] {
            let (status, _) = post_filter(&app.router, body.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_photo_served_with_content_type() {
        let app = test_app().await;
        let product = app.store.product_by_slug("product-3").await.unwrap().unwrap();

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(product.photo_path())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_missing_photo_is_not_found() {
        let app = test_app().await;
        let product = app.store.product_by_slug("product-4").await.unwrap().unwrap();
        let (status, _) = send(
            &app.router,
            Request::builder()
                .uri(product.photo_path())
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_by_slug() {
        let app = test_app().await;
        let (status, body): (_, ProductResponse) =
            get_json(&app.router, &paths::product_by_slug("product-7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.product.name, "Product 7");

        let (status, _): (_, ErrorResponse) =
            get_json(&app.router, &paths::product_by_slug("nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_outage_is_service_unavailable() {
        let app = test_app().await;
        app.store.set_unavailable(true);

        let (status, err): (_, ErrorResponse) =
            get_json(&app.router, &paths::product_list(1)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message, "Catalog temporarily unavailable");

        let (status, _) = send(
            &app.router,
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
