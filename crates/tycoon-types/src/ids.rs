//! Type-safe identifier wrappers.
//!
//! Runtime records created by the engine (ledger effects) carry a
//! UUID v7 identifier generated in-process. Authored content (events,
//! choices, flags, upgrades, staff roles) carries the string key assigned
//! by the content console, wrapped in its own newtype so an event key can
//! never be passed where a flag key is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around an authored string key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an authored key.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an effect held by the modifier ledger.
    EffectId
}

define_key! {
    /// Identifier of the producer of an effect within its category
    /// (an upgrade key, a campaign key, a staff role key, an event key).
    SourceId
}

define_key! {
    /// Authored key of a game event.
    EventId
}

define_key! {
    /// Authored key of a choice within an event.
    ChoiceId
}

define_key! {
    /// Authored key of a consequence within a choice.
    ConsequenceId
}

define_key! {
    /// Authored key of a delayed consequence.
    DelayedConsequenceId
}

define_key! {
    /// Key of a boolean story flag.
    FlagId
}

define_key! {
    /// Key of a designer-authored named condition.
    ConditionId
}

define_key! {
    /// Key of a purchasable upgrade.
    UpgradeId
}

define_key! {
    /// Key of a hireable staff role.
    StaffRoleId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_ids_are_unique() {
        let a = EffectId::new();
        let b = EffectId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn keys_serialize_as_plain_strings() {
        let key = EventId::new("supplier_strike");
        let json = serde_json::to_string(&key).ok();
        assert_eq!(json.as_deref(), Some("\"supplier_strike\""));

        let restored: Result<FlagId, _> = serde_json::from_str("\"met_investor\"");
        assert_eq!(restored.ok(), Some(FlagId::from("met_investor")));
    }

    #[test]
    fn key_display_matches_inner() {
        let key = UpgradeId::from("espresso_machine");
        assert_eq!(key.to_string(), "espresso_machine");
        assert_eq!(key.as_str(), "espresso_machine");
    }
}
