//! Review endpoints: submission, like-toggling, and seller replies.
//!
//! The interaction rules live here as exhaustive role matches; the
//! atomicity of the underlying mutations lives in the store.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ecowear_shared::Role;
use ecowear_store::{Database, Review, ReviewReply, StoreError};

use crate::api::AppState;
use crate::auth::{authenticate, AuthUser};
use crate::error::{require, require_text, ApiError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug)]
pub struct AuthorRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: Uuid,
    pub user: AuthorRef,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A review with author name, like-set, and reply sequence resolved inline.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user: AuthorRef,
    pub rating: u8,
    pub sustainability_rating: u8,
    pub comment: String,
    /// Liking user ids, most recent first.
    pub likes: Vec<Uuid>,
    pub replies: Vec<ReplyView>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    rating: Option<i64>,
    sustainability_rating: Option<i64>,
    comment: Option<String>,
}

#[derive(Deserialize)]
pub struct ReplyRequest {
    comment: Option<String>,
}

/// Resolve an author name. Authors are authenticated accounts, so a dangling
/// reference should not happen; degrade to a placeholder rather than failing
/// the whole listing if it somehow does.
fn author_ref(db: &Database, id: Uuid) -> Result<AuthorRef, ApiError> {
    match db.get_user(id) {
        Ok(user) => Ok(AuthorRef {
            id: user.id,
            name: user.name,
        }),
        Err(StoreError::NotFound) => Ok(AuthorRef {
            id,
            name: "unknown".to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn reply_view(db: &Database, reply: ReviewReply) -> Result<ReplyView, ApiError> {
    Ok(ReplyView {
        id: reply.id,
        user: author_ref(db, reply.user_id)?,
        comment: reply.comment,
        created_at: reply.created_at,
    })
}

fn review_view(db: &Database, review: Review) -> Result<ReviewView, ApiError> {
    let likes = db.likes_for_review(review.id)?;

    let mut replies = Vec::new();
    for reply in db.replies_for_review(review.id)? {
        replies.push(reply_view(db, reply)?);
    }

    Ok(ReviewView {
        id: review.id,
        product_id: review.product_id,
        user: author_ref(db, review.user_id)?,
        rating: review.rating,
        sustainability_rating: review.sustainability_rating,
        comment: review.comment,
        likes,
        replies,
        created_at: review.created_at,
    })
}

fn rating_in_range(value: i64, field: &str) -> Result<u8, ApiError> {
    if !(1..=5).contains(&value) {
        return Err(ApiError::Validation(format!(
            "{field} must be between 1 and 5"
        )));
    }
    Ok(value as u8)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A product's reviews in submission order, names resolved. Public.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewView>>, ApiError> {
    let db = state.db.lock().await;

    let reviews = db.list_reviews_for_product(product_id)?;
    let mut views = Vec::with_capacity(reviews.len());
    for review in reviews {
        views.push(review_view(&db, review)?);
    }
    Ok(Json(views))
}

/// Submit a review. Any authenticated non-seller; a user may review the same
/// product more than once.
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<ReviewView>, ApiError> {
    let caller = authenticate(&headers, &state)?;
    ensure_can_review(&caller)?;

    let review = Review {
        id: Uuid::new_v4(),
        product_id,
        user_id: caller.user_id,
        rating: rating_in_range(require(req.rating, "rating")?, "rating")?,
        sustainability_rating: rating_in_range(
            require(req.sustainability_rating, "sustainabilityRating")?,
            "sustainabilityRating",
        )?,
        comment: require_text(req.comment, "comment")?,
        created_at: Utc::now(),
    };

    let db = state.db.lock().await;
    db.insert_review(&review)?;
    let view = review_view(&db, review)?;
    drop(db);

    info!(review = %view.id, product = %product_id, "review submitted");
    Ok(Json(view))
}

/// Flip the caller's membership in a review's like-set and return the
/// resulting set. Any authenticated user.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let caller = authenticate(&headers, &state)?;

    let likes = state
        .db
        .lock()
        .await
        .toggle_like(id, caller.user_id)
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Review not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(likes))
}

/// Append a reply and return the full updated sequence. Sellers and admins
/// only; the role gate fires before the existence check.
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ReplyRequest>,
) -> Result<Json<Vec<ReplyView>>, ApiError> {
    let caller = authenticate(&headers, &state)?;
    ensure_can_reply(&caller)?;

    let comment = require_text(req.comment, "comment")?;

    let db = state.db.lock().await;

    db.get_review(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("Review not found".to_string()),
        other => other.into(),
    })?;

    db.append_reply(&ReviewReply {
        id: Uuid::new_v4(),
        review_id: id,
        user_id: caller.user_id,
        comment,
        created_at: Utc::now(),
    })?;

    let mut views = Vec::new();
    for reply in db.replies_for_review(id)? {
        views.push(reply_view(&db, reply)?);
    }
    Ok(Json(views))
}

fn ensure_can_review(caller: &AuthUser) -> Result<(), ApiError> {
    match caller.role {
        Role::Buyer | Role::Admin => Ok(()),
        Role::Seller => Err(ApiError::Forbidden(
            "Sellers cannot add reviews".to_string(),
        )),
    }
}

fn ensure_can_reply(caller: &AuthUser) -> Result<(), ApiError> {
    match caller.role {
        Role::Seller | Role::Admin => Ok(()),
        Role::Buyer => Err(ApiError::Forbidden("Only sellers can reply".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{seeded_caller, test_state};

    fn review_request(comment: &str) -> CreateReviewRequest {
        CreateReviewRequest {
            rating: Some(4),
            sustainability_rating: Some(5),
            comment: Some(comment.to_string()),
        }
    }

    #[tokio::test]
    async fn seller_cannot_review_and_nothing_is_written() {
        let state = test_state();
        let (_, headers) = seeded_caller(&state, Role::Seller, "Green Threads Co").await;
        let product_id = Uuid::new_v4();

        let err = create_review(
            State(state.clone()),
            Path(product_id),
            headers,
            Json(review_request("nice")),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(state
            .db
            .lock()
            .await
            .list_reviews_for_product(product_id)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn buyer_review_resolves_the_author_name() {
        let state = test_state();
        let (buyer, headers) = seeded_caller(&state, Role::Buyer, "Ada").await;
        let product_id = Uuid::new_v4();

        let created = create_review(
            State(state.clone()),
            Path(product_id),
            headers,
            Json(review_request("Holding up well.")),
        )
        .await
        .unwrap();

        assert_eq!(created.0.user.id, buyer.id);
        assert_eq!(created.0.user.name, "Ada");
        assert!(created.0.likes.is_empty());
        assert!(created.0.replies.is_empty());

        let listed = list_reviews(State(state.clone()), Path(product_id))
            .await
            .unwrap();
        assert_eq!(listed.0.len(), 1);
        assert_eq!(listed.0[0].user.name, "Ada");
    }

    #[tokio::test]
    async fn out_of_range_rating_is_a_validation_error() {
        let state = test_state();
        let (_, headers) = seeded_caller(&state, Role::Buyer, "Ada").await;

        let mut req = review_request("x");
        req.rating = Some(6);

        let err = create_review(State(state.clone()), Path(Uuid::new_v4()), headers, Json(req))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn like_toggle_pair_returns_to_empty() {
        let state = test_state();
        let (_, author_headers) = seeded_caller(&state, Role::Buyer, "Ada").await;
        let (liker, liker_headers) = seeded_caller(&state, Role::Buyer, "Grace").await;

        let review = create_review(
            State(state.clone()),
            Path(Uuid::new_v4()),
            author_headers,
            Json(review_request("nice")),
        )
        .await
        .unwrap();

        let likes = toggle_like(
            State(state.clone()),
            Path(review.0.id),
            liker_headers.clone(),
        )
        .await
        .unwrap();
        assert_eq!(likes.0, vec![liker.id]);

        let likes = toggle_like(State(state.clone()), Path(review.0.id), liker_headers)
            .await
            .unwrap();
        assert!(likes.0.is_empty());
    }

    #[tokio::test]
    async fn liking_a_missing_review_is_not_found() {
        let state = test_state();
        let (_, headers) = seeded_caller(&state, Role::Buyer, "Ada").await;

        let err = toggle_like(State(state.clone()), Path(Uuid::new_v4()), headers)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn buyer_cannot_reply_and_sequence_is_unchanged() {
        let state = test_state();
        let (_, author_headers) = seeded_caller(&state, Role::Buyer, "Ada").await;
        let (_, buyer_headers) = seeded_caller(&state, Role::Buyer, "Grace").await;

        let review = create_review(
            State(state.clone()),
            Path(Uuid::new_v4()),
            author_headers,
            Json(review_request("nice")),
        )
        .await
        .unwrap();

        let err = reply(
            State(state.clone()),
            Path(review.0.id),
            buyer_headers,
            Json(ReplyRequest {
                comment: Some("thanks!".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(state
            .db
            .lock()
            .await
            .replies_for_review(review.0.id)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn replies_arrive_in_submission_order_with_names() {
        let state = test_state();
        let (_, author_headers) = seeded_caller(&state, Role::Buyer, "Ada").await;
        let (_, seller_headers) = seeded_caller(&state, Role::Seller, "Green Threads Co").await;

        let review = create_review(
            State(state.clone()),
            Path(Uuid::new_v4()),
            author_headers,
            Json(review_request("nice")),
        )
        .await
        .unwrap();

        for comment in ["A", "B"] {
            reply(
                State(state.clone()),
                Path(review.0.id),
                seller_headers.clone(),
                Json(ReplyRequest {
                    comment: Some(comment.to_string()),
                }),
            )
            .await
            .unwrap();
        }

        let listed = list_reviews(State(state.clone()), Path(review.0.product_id))
            .await
            .unwrap();
        let replies = &listed.0[0].replies;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].comment, "A");
        assert_eq!(replies[1].comment, "B");
        assert_eq!(replies[0].user.name, "Green Threads Co");
    }

    #[tokio::test]
    async fn replying_to_a_missing_review_is_not_found() {
        let state = test_state();
        let (_, headers) = seeded_caller(&state, Role::Seller, "Green Threads Co").await;

        let err = reply(
            State(state.clone()),
            Path(Uuid::new_v4()),
            headers,
            Json(ReplyRequest {
                comment: Some("hello".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
