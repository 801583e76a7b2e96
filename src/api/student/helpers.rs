use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::services::access::{self, AccessDecision};

pub(super) async fn require_exam_access(
    state: &AppState,
    user: &User,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), ApiError> {
    match check_exam_access(state, user, exam_id, now).await? {
        AccessDecision::Granted => Ok(()),
        AccessDecision::Denied => Err(ApiError::forbidden("You don't have access to this exam")),
        AccessDecision::VipRequired(section) => {
            Err(ApiError::forbidden(section.vip_required_message()))
        }
    }
}

pub(super) async fn check_exam_access(
    state: &AppState,
    user: &User,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<AccessDecision, ApiError> {
    access::check(state.db(), user, exam_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check exam access"))
}
