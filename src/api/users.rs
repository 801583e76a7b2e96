use axum::{routing::get, Json, Router};

use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::user::UserResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use time::Duration;
    use tower::ServiceExt;

    use crate::core::time::primitive_now_utc;
    use crate::db::types::UserRole;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn me_returns_profile_without_password_hash() {
        let ctx = test_support::setup_test_context().await;
        let user =
            test_support::insert_user(ctx.state.db(), "vipcustomer", UserRole::Customer, true).await;
        let token = test_support::bearer_token(&user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users/me", Some(&token), None))
            .await
            .expect("me");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["username"], "vipcustomer");
        assert_eq!(body["role"], "customer");
        assert_eq!(body["is_vip"], true);
        assert!(body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_unauthorized() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users/me", None, None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get("www-authenticate").expect("header"), "Bearer");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/users/me",
                Some("not-a-jwt"),
                None,
            ))
            .await
            .expect("me");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Could not validate credentials");
    }

    #[tokio::test]
    async fn expired_student_is_deactivated_on_first_request() {
        let ctx = test_support::setup_test_context().await;
        let activated_at = primitive_now_utc() - Duration::days(61);
        let student = test_support::insert_user_activated_at(
            ctx.state.db(),
            "oldstudent",
            UserRole::Student,
            false,
            Some(activated_at),
        )
        .await;
        let token = test_support::bearer_token(&student.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users/me", Some(&token), None))
            .await
            .expect("me");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Account has expired");

        let stored = repositories::users::find_by_id(ctx.state.db(), &student.id)
            .await
            .expect("query")
            .expect("user");
        assert!(!stored.is_active);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users/me", Some(&token), None))
            .await
            .expect("me");
        let body = test_support::read_json(response).await;
        assert_eq!(body["detail"], "Account is not active");
    }
}
