//! Strongly typed string identifiers.
//!
//! The simulator names vehicles, edges, and signals with free-form strings
//! (`"dyn_2001"`, `"-174032654#1"`, `"cluster_2579637038_818520857"`), so the
//! wrappers hold a `String` rather than an index.  All IDs are
//! `Clone + Ord + Hash` and implement `Borrow<str>`, so a `HashMap<EdgeId, _>`
//! can be queried with a plain `&str`.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed ID wrapper around a `String`.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        $vis struct $name(pub String);

        impl $name {
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            #[inline]
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A simulated vehicle.  Unique among live vehicles.
    pub struct VehicleId;
}

string_id! {
    /// A directed road edge (the "location" that stop counting is keyed on).
    pub struct EdgeId;
}

string_id! {
    /// A signalised junction (traffic-light program owner).
    pub struct SignalId;
}

impl EdgeId {
    /// Junction-internal edges are prefixed with `:` by the simulator and are
    /// never valid departure or arrival edges.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with(':')
    }
}
