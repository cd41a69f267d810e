// crates/model-gate-core/src/identifiers.rs
// ============================================================================
// Module: Model Gate Identifiers
// Description: Opaque identifiers for tenants, models, plans, and traces.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque UTF-8 strings that serialize transparently. They
//! exist so tenant ids, model names, and plan ids cannot be swapped by
//! accident at API boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares an opaque string identifier with the shared trait surface.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier!(
    /// Tenant identifier used as the isolation and billing key.
    ///
    /// # Invariants
    /// - Unique per tenant policy within a route store.
    TenantId
);

string_identifier!(
    /// Logical model name requested by callers or declared by routes.
    ///
    /// # Invariants
    /// - Compared byte-for-byte; no case folding is applied.
    ModelName
);

string_identifier!(
    /// Rollout plan identifier carried at `data.plan.id` in plan envelopes.
    PlanId
);

string_identifier!(
    /// Dispatch trace identifier.
    ///
    /// # Invariants
    /// - Generated values are 32 lowercase hex characters.
    TraceId
);

impl TraceId {
    /// Generates a random trace identifier from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 16];
        OsRng.fill_bytes(&mut bytes);
        let mut encoded = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(encoded, "{byte:02x}");
        }
        Self(encoded)
    }
}
