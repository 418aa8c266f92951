use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;

/// Privilege level stored on a profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parse the backend's free-text role column.
    ///
    /// Anything unrecognized (including a missing value) is treated as a
    /// regular user.
    #[must_use]
    pub fn from_column(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paid plan level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl SubscriptionTier {
    #[must_use]
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "basic" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Premium => "premium",
        }
    }

    /// Display name, e.g. for "You're currently on the Basic plan".
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Basic => "Basic",
            SubscriptionTier::Premium => "Premium",
        }
    }

    #[must_use]
    pub fn unlocks_premium(self) -> bool {
        matches!(self, SubscriptionTier::Basic | SubscriptionTier::Premium)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-stored record joining an identity to its role and tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub subscription_tier: SubscriptionTier,
}

/// Row inserted when an account registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
}

impl NewProfile {
    pub fn free(id: UserId, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            email: email.into(),
            subscription_tier: SubscriptionTier::Free,
        }
    }

    #[must_use]
    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            full_name: Some(self.full_name),
            email: self.email,
            role: Role::User,
            subscription_tier: self.subscription_tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_user() {
        assert_eq!(Role::from_column(Some("admin")), Role::Admin);
        assert_eq!(Role::from_column(Some(" Admin ")), Role::Admin);
        assert_eq!(Role::from_column(Some("editor")), Role::User);
        assert_eq!(Role::from_column(None), Role::User);
    }

    #[test]
    fn tier_parses_known_values_only() {
        assert_eq!(SubscriptionTier::from_column("premium"), Some(SubscriptionTier::Premium));
        assert_eq!(SubscriptionTier::from_column("gold"), None);
    }

    #[test]
    fn only_paid_tiers_unlock_premium() {
        assert!(!SubscriptionTier::Free.unlocks_premium());
        assert!(SubscriptionTier::Basic.unlocks_premium());
        assert!(SubscriptionTier::Premium.unlocks_premium());
    }

    #[test]
    fn registration_profile_starts_free() {
        let profile = NewProfile::free(UserId::random(), "Juan", "juan@example.com").into_profile();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Free);
    }
}
