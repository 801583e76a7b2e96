use time::PrimitiveDateTime;

use crate::db::types::{PaymentStatus, SectionType, VipPackageType};

/// True when the user holds a paid, unexpired subscription whose package covers
/// `section_type` (all skills, or the matching single skill).
pub(crate) async fn has_covering_subscription(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    section_type: SectionType,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1
            FROM vip_subscriptions s
            JOIN vip_packages p ON p.id = s.package_id
            WHERE s.user_id = $1
              AND s.end_date > $2
              AND s.payment_status = $3
              AND (p.package_type = $4 OR (p.package_type = $5 AND p.skill_type = $6))
        )",
    )
    .bind(user_id)
    .bind(now)
    .bind(PaymentStatus::Completed)
    .bind(VipPackageType::AllSkills)
    .bind(VipPackageType::SingleSkill)
    .bind(section_type)
    .fetch_one(executor)
    .await
}
