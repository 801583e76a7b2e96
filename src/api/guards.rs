use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::time::{primitive_now_utc, window_elapsed};
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

/// Any authenticated, active account.
pub(crate) struct CurrentUser(pub(crate) User);
/// Students and customers: the accounts that take exams.
pub(crate) struct CurrentStudent(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?
            .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        if !user.is_active {
            return Err(ApiError::forbidden("Account is not active"));
        }

        expire_student_account(&app_state, &user).await?;

        Ok(CurrentUser(user))
    }
}

/// Student accounts lapse a fixed number of days after activation; the first request
/// after that deactivates the account.
async fn expire_student_account(state: &AppState, user: &User) -> Result<(), ApiError> {
    let Some(activated_at) = user.account_activated_at else {
        return Ok(());
    };
    if user.role != UserRole::Student {
        return Ok(());
    }

    let now = primitive_now_utc();
    let valid_days = state.settings().accounts().student_valid_days;
    if !window_elapsed(activated_at, valid_days, now) {
        return Ok(());
    }

    repositories::users::deactivate(state.db(), &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to deactivate expired account"))?;
    tracing::info!(user_id = %user.id, valid_days, "Student account expired");

    Err(ApiError::forbidden("Account has expired"))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        match user.role {
            UserRole::Student | UserRole::Customer => Ok(CurrentStudent(user)),
            UserRole::Admin => {
                Err(ApiError::forbidden("Only students and customers can perform this action"))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role == UserRole::Admin {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}
