//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Board`](crate::board::Board).
    BoardId
);

define_id!(
    /// Unique identifier for a [`List`](crate::board::List) (column).
    ListId
);

define_id!(
    /// Unique identifier for a [`Card`](crate::card::Card).
    CardId
);

define_id!(
    /// Unique identifier for a [`CardPlacement`](crate::card::CardPlacement).
    PlacementId
);

define_id!(
    /// Unique identifier for a [`Label`](crate::board::Label).
    LabelId
);

define_id!(
    /// Unique identifier for a [`CustomFieldDefinition`](crate::board::CustomFieldDefinition).
    FieldDefinitionId
);

define_id!(
    /// Unique identifier for a user. Users live in the external auth system.
    UserId
);

define_id!(
    /// Unique identifier for an [`AutomationRule`](crate::automation::AutomationRule).
    RuleId
);

define_id!(
    /// Unique identifier for a [`MirrorRule`](crate::mirror::MirrorRule).
    MirrorRuleId
);

define_id!(
    /// Unique identifier for an [`ExecutionLogEntry`](crate::audit::ExecutionLogEntry).
    LogEntryId
);

define_id!(
    /// Unique identifier for an [`ActivityEntry`](crate::audit::ActivityEntry).
    ActivityId
);
