//! User API Endpoints
//!
//! Registration, social actions and impact read-outs. Authentication is
//! handled upstream; the path user id is trusted as the acting user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::database::{Notification, User};
use crate::impact::ImpactUpdate;
use crate::social::{ImpactSummary, NewUser, SocialService};

const DEFAULT_NOTIFICATION_LIMIT: usize = 50;
const MAX_NOTIFICATION_LIMIT: usize = 200;

/// API state for user endpoints
#[derive(Clone)]
pub struct UsersApiState {
    pub service: Arc<SocialService>,
}

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub followed_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub publication_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub publication_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub limit: Option<usize>,
}

/// POST /users - Register an account
pub async fn register_user(
    State(state): State<UsersApiState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.service.register_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/:user_id/impact
pub async fn get_impact(
    State(state): State<UsersApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<ImpactSummary>, ApiError> {
    Ok(Json(state.service.impact(&user_id).await?))
}

/// POST /users/:user_id/follows
pub async fn follow(
    State(state): State<UsersApiState>,
    Path(user_id): Path<String>,
    Json(payload): Json<FollowRequest>,
) -> Result<Json<ImpactUpdate>, ApiError> {
    Ok(Json(state.service.follow(&user_id, &payload.followed_id).await?))
}

/// POST /users/:user_id/likes
pub async fn like(
    State(state): State<UsersApiState>,
    Path(user_id): Path<String>,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<ImpactUpdate>, ApiError> {
    Ok(Json(state.service.like(&user_id, &payload.publication_id).await?))
}

/// POST /users/:user_id/comments
pub async fn comment(
    State(state): State<UsersApiState>,
    Path(user_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<ImpactUpdate>, ApiError> {
    let update = state
        .service
        .comment(&user_id, &payload.publication_id, &payload.content)
        .await?;
    Ok(Json(update))
}

/// GET /users/:user_id/notifications?limit=N
pub async fn list_notifications(
    State(state): State<UsersApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);
    Ok(Json(state.service.notifications(&user_id, limit).await?))
}

/// Create the user API router
pub fn create_router(state: UsersApiState) -> Router {
    Router::new()
        .route("/", post(register_user))
        .route("/{user_id}/impact", get(get_impact))
        .route("/{user_id}/follows", post(follow))
        .route("/{user_id}/likes", post(like))
        .route("/{user_id}/comments", post(comment))
        .route("/{user_id}/notifications", get(list_notifications))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{AccountKind, MemoryStore, NotificationKind};
    use crate::impact::ImpactEngine;

    fn state() -> UsersApiState {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(ImpactEngine::new(store.clone(), store.clone(), store.clone()));
        UsersApiState {
            service: Arc::new(SocialService::new(
                store.clone(),
                store.clone(),
                store,
                engine,
            )),
        }
    }

    async fn register(state: &UsersApiState, id: &str, kind: AccountKind) {
        let (status, _) = register_user(
            State(state.clone()),
            Json(NewUser {
                id: Some(id.to_string()),
                display_name: id.to_string(),
                email: format!("{}@example.org", id),
                kind,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_follow_endpoint_returns_update() {
        let state = state();
        register(&state, "alice", AccountKind::User).await;
        register(&state, "wwf", AccountKind::Association).await;

        let Json(update) = follow(
            State(state.clone()),
            Path("alice".to_string()),
            Json(FollowRequest {
                followed_id: "wwf".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(update, ImpactUpdate::none());

        let Json(summary) = get_impact(State(state.clone()), Path("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(summary.impact_points, 3);
        assert_eq!(summary.total_valid_actions, 1);
        assert_eq!(summary.actions_until_next_block, 7);

        let Json(inbox) = list_notifications(
            State(state),
            Path("wwf".to_string()),
            Query(NotificationsQuery { limit: None }),
        )
        .await
        .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Follow);
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let state = state();
        register(&state, "alice", AccountKind::User).await;

        let missing = get_impact(State(state.clone()), Path("ghost".to_string())).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        let self_follow = follow(
            State(state.clone()),
            Path("alice".to_string()),
            Json(FollowRequest {
                followed_id: "alice".to_string(),
            }),
        )
        .await;
        assert!(matches!(self_follow, Err(ApiError::BadRequest(_))));

        let duplicate = register_user(
            State(state),
            Json(NewUser {
                id: Some("alice".to_string()),
                display_name: "Alice".to_string(),
                email: "alice@example.org".to_string(),
                kind: AccountKind::User,
            }),
        )
        .await;
        assert!(matches!(duplicate, Err(ApiError::Conflict(_))));
    }
}
