// 👤 Member Entity - people who borrow and reserve books
//
// `has_borrowed` mirrors the borrowing state machine: it is true exactly
// while one active Transaction references the member.

use crate::error::{LibraryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Youngest age allowed to register
pub const MINIMUM_MEMBER_AGE: u32 = 12;

// ============================================================================
// MEMBERSHIP TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    Standard,
    Gold,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Standard => "standard",
            MembershipTier::Gold => "gold",
        }
    }

    /// Weight used by the priority score
    pub fn weight(&self) -> f64 {
        match self {
            MembershipTier::Gold => 1.5,
            MembershipTier::Standard => 1.0,
        }
    }
}

// ============================================================================
// MEMBER ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub has_borrowed: bool,
    pub membership_tier: MembershipTier,
    pub created_at: DateTime<Utc>,
}

/// Registration data. `id` is optional: when absent the store assigns one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMember {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub membership_tier: MembershipTier,
}

impl NewMember {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        NewMember {
            id: None,
            name: name.into(),
            age,
            membership_tier: MembershipTier::Standard,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_tier(mut self, tier: MembershipTier) -> Self {
        self.membership_tier = tier;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_age(self.age)
    }
}

/// Field-by-field update. There is no id field, so identity cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub has_borrowed: Option<bool>,
    pub membership_tier: Option<MembershipTier>,
}

impl MemberPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }
}

impl Member {
    pub fn from_new(id: u64, data: NewMember, now: DateTime<Utc>) -> Self {
        Member {
            id,
            name: data.name,
            age: data.age,
            has_borrowed: false,
            membership_tier: data.membership_tier,
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: MemberPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(has_borrowed) = patch.has_borrowed {
            self.has_borrowed = has_borrowed;
        }
        if let Some(tier) = patch.membership_tier {
            self.membership_tier = tier;
        }
    }
}

fn validate_age(age: u32) -> Result<()> {
    if age < MINIMUM_MEMBER_AGE {
        return Err(LibraryError::validation(
            "age",
            format!("{} is below the minimum age of {}", age, MINIMUM_MEMBER_AGE),
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LibraryError::validation("name", "must be a non-empty string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_weights() {
        assert_eq!(MembershipTier::Gold.weight(), 1.5);
        assert_eq!(MembershipTier::Standard.weight(), 1.0);
        assert_eq!(MembershipTier::default(), MembershipTier::Standard);
    }

    #[test]
    fn test_age_validation() {
        assert!(NewMember::new("Ada", 12).validate().is_ok());

        let err = NewMember::new("Kid", 11).validate().unwrap_err();
        assert_eq!(err.code(), "validation_error");

        let patch = MemberPatch {
            age: Some(5),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(NewMember::new("   ", 30).validate().is_err());
    }

    #[test]
    fn test_apply_patch_keeps_identity() {
        let mut member = Member::from_new(7, NewMember::new("Ada", 30), Utc::now());
        member.apply(MemberPatch {
            name: Some("Ada Lovelace".to_string()),
            membership_tier: Some(MembershipTier::Gold),
            ..Default::default()
        });

        assert_eq!(member.id, 7);
        assert_eq!(member.name, "Ada Lovelace");
        assert_eq!(member.age, 30);
        assert_eq!(member.membership_tier, MembershipTier::Gold);
        assert!(!member.has_borrowed);
    }

    #[test]
    fn test_tier_serializes_snake_case() {
        let json = serde_json::to_string(&MembershipTier::Gold).unwrap();
        assert_eq!(json, "\"gold\"");
    }
}
