use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Student,
    Customer,
}

/// Skill covered by an exam section. Writing sections are stored as `essay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "sectiontype", rename_all = "lowercase")]
pub(crate) enum SectionType {
    Listening,
    Reading,
    #[serde(alias = "writing")]
    Essay,
    Speaking,
}

impl SectionType {
    pub(crate) fn vip_required_message(self) -> &'static str {
        match self {
            Self::Listening => "You need a VIP subscription for listening tests",
            Self::Reading => "You need a VIP subscription for reading tests",
            Self::Essay => "You need a VIP subscription for essay tests",
            Self::Speaking => "You need a VIP subscription for speaking tests",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "vippackagetype", rename_all = "snake_case")]
pub(crate) enum VipPackageType {
    AllSkills,
    SingleSkill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentstatus", rename_all = "lowercase")]
pub(crate) enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// Per-exam audience tag. Stored as free text; unknown values never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum AccessType {
    #[serde(rename = "no vip")]
    NoVip,
    #[serde(rename = "vip")]
    Vip,
    #[serde(rename = "student")]
    Student,
}

impl AccessType {
    pub(crate) const ALL: [AccessType; 3] = [Self::NoVip, Self::Vip, Self::Student];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::NoVip => "no vip",
            Self::Vip => "vip",
            Self::Student => "student",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == value)
    }
}
