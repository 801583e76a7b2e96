//! Decides whether a user may take an exam.
//!
//! Evaluation is split in two: [`load_facts`] gathers what the database knows about
//! the exam and the user, [`evaluate`] applies the rules to those facts.

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::{AccessType, SectionType, UserRole};
use crate::repositories;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Subject {
    pub(crate) role: UserRole,
    pub(crate) is_vip: bool,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self { role: user.role, is_vip: user.is_vip }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ExamFacts {
    pub(crate) primary_section: Option<SectionType>,
    pub(crate) access_types: Vec<AccessType>,
    /// Only meaningful for VIP customers; loaders leave it `false` for everyone else.
    pub(crate) has_covering_subscription: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccessDecision {
    Granted,
    Denied,
    VipRequired(SectionType),
}

impl AccessDecision {
    pub(crate) fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

pub(crate) fn allowed_access_types(subject: Subject) -> &'static [AccessType] {
    match (subject.role, subject.is_vip) {
        (UserRole::Admin, _) => &[AccessType::Student, AccessType::NoVip, AccessType::Vip],
        (UserRole::Student, _) => &[AccessType::Student],
        (UserRole::Customer, false) => &[AccessType::NoVip],
        (UserRole::Customer, true) => &[AccessType::NoVip, AccessType::Vip],
    }
}

pub(crate) fn evaluate(subject: Subject, facts: &ExamFacts) -> AccessDecision {
    let Some(section) = facts.primary_section else {
        return AccessDecision::Denied;
    };

    if section == SectionType::Speaking {
        return AccessDecision::Granted;
    }

    if subject.role == UserRole::Customer && subject.is_vip && !facts.has_covering_subscription {
        return AccessDecision::VipRequired(section);
    }

    let allowed = allowed_access_types(subject);
    if facts.access_types.iter().any(|tag| allowed.contains(tag)) {
        AccessDecision::Granted
    } else {
        AccessDecision::Denied
    }
}

pub(crate) async fn load_facts(
    pool: &PgPool,
    subject: Subject,
    user_id: &str,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<ExamFacts, sqlx::Error> {
    let primary_section = repositories::sections::primary_section_type(pool, exam_id).await?;
    let Some(section) = primary_section else {
        return Ok(ExamFacts::default());
    };

    let access_types = repositories::exams::list_access_types(pool, exam_id)
        .await?
        .iter()
        .filter_map(|raw| AccessType::parse(raw))
        .collect();

    let has_covering_subscription = if subject.role == UserRole::Customer && subject.is_vip {
        repositories::subscriptions::has_covering_subscription(pool, user_id, section, now).await?
    } else {
        false
    };

    Ok(ExamFacts { primary_section, access_types, has_covering_subscription })
}

pub(crate) async fn check(
    pool: &PgPool,
    user: &User,
    exam_id: &str,
    now: PrimitiveDateTime,
) -> Result<AccessDecision, sqlx::Error> {
    let subject = Subject::from(user);
    let facts = load_facts(pool, subject, &user.id, exam_id, now).await?;
    let decision = evaluate(subject, &facts);

    tracing::debug!(
        user_id = %user.id,
        exam_id,
        role = ?subject.role,
        is_vip = subject.is_vip,
        decision = ?decision,
        "Evaluated exam access"
    );

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Subject = Subject { role: UserRole::Student, is_vip: false };
    const ADMIN: Subject = Subject { role: UserRole::Admin, is_vip: false };
    const CUSTOMER: Subject = Subject { role: UserRole::Customer, is_vip: false };
    const VIP_CUSTOMER: Subject = Subject { role: UserRole::Customer, is_vip: true };

    fn facts(section: SectionType, tags: &[AccessType], covered: bool) -> ExamFacts {
        ExamFacts {
            primary_section: Some(section),
            access_types: tags.to_vec(),
            has_covering_subscription: covered,
        }
    }

    #[test]
    fn student_only_exam_excludes_every_customer() {
        let exam = facts(SectionType::Reading, &[AccessType::Student], true);

        assert_eq!(evaluate(STUDENT, &exam), AccessDecision::Granted);
        assert_eq!(evaluate(ADMIN, &exam), AccessDecision::Granted);
        assert_eq!(evaluate(CUSTOMER, &exam), AccessDecision::Denied);
        assert_eq!(evaluate(VIP_CUSTOMER, &exam), AccessDecision::Denied);
    }

    #[test]
    fn vip_customer_without_subscription_is_refused_even_on_open_exam() {
        let exam = facts(SectionType::Listening, &[AccessType::NoVip], false);

        assert_eq!(
            evaluate(VIP_CUSTOMER, &exam),
            AccessDecision::VipRequired(SectionType::Listening)
        );
        assert_eq!(evaluate(CUSTOMER, &exam), AccessDecision::Granted);
    }

    #[test]
    fn vip_tag_needs_vip_customer_or_admin() {
        let exam = facts(SectionType::Reading, &[AccessType::Vip], true);

        assert_eq!(evaluate(VIP_CUSTOMER, &exam), AccessDecision::Granted);
        assert_eq!(evaluate(ADMIN, &exam), AccessDecision::Granted);
        assert_eq!(evaluate(CUSTOMER, &exam), AccessDecision::Denied);
        assert_eq!(evaluate(STUDENT, &exam), AccessDecision::Denied);
    }

    #[test]
    fn speaking_is_open_to_everyone() {
        let exam = facts(SectionType::Speaking, &[], false);

        for subject in [STUDENT, ADMIN, CUSTOMER, VIP_CUSTOMER] {
            assert!(evaluate(subject, &exam).is_granted());
        }
    }

    #[test]
    fn missing_sections_or_tags_fail_closed() {
        let empty = ExamFacts::default();
        let untagged = facts(SectionType::Reading, &[], true);

        for subject in [STUDENT, ADMIN, CUSTOMER, VIP_CUSTOMER] {
            assert_eq!(evaluate(subject, &empty), AccessDecision::Denied);
            assert_eq!(evaluate(subject, &untagged), AccessDecision::Denied);
        }
    }

    #[test]
    fn allowed_sets_follow_role_and_vip_flag() {
        assert_eq!(allowed_access_types(STUDENT), &[AccessType::Student]);
        assert_eq!(allowed_access_types(CUSTOMER), &[AccessType::NoVip]);
        assert_eq!(allowed_access_types(VIP_CUSTOMER), &[AccessType::NoVip, AccessType::Vip]);
        assert_eq!(allowed_access_types(ADMIN).len(), 3);
    }
}
