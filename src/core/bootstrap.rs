use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured first admin can sign in.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let username = admin.first_admin_username.as_str();
    let now = primitive_now_utc();
    let existing = repositories::users::find_by_username(state.db(), username).await?;

    if let Some(user) = existing {
        let password_matches =
            security::verify_password(&admin.first_admin_password, &user.hashed_password)
                .unwrap_or(false);
        if password_matches && user.role == UserRole::Admin && user.is_active {
            tracing::info!(username, "First admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_matches {
            user.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_admin_password)?
        };
        repositories::users::promote_to_admin(state.db(), &user.id, &hashed_password, now)
            .await?;
        tracing::info!(username, user_id = %user.id, "Updated first admin");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            email: &admin.first_admin_email,
            hashed_password,
            role: UserRole::Admin,
            is_vip: false,
            is_active: true,
            account_activated_at: None,
            now,
        },
    )
    .await?;

    tracing::info!(username, user_id = %user.id, "Created first admin");
    Ok(())
}
