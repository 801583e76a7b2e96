use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) is_vip: bool,
    pub(crate) is_active: bool,
    pub(crate) account_activated_at: Option<String>,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_vip: user.is_vip,
            is_active: user.is_active,
            account_activated_at: user.account_activated_at.map(format_primitive),
            created_at: format_primitive(user.created_at),
        }
    }
}
