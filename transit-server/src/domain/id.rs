//! Typed identifiers for GTFS entities.
//!
//! GTFS feeds use opaque strings as identifiers. Wrapping them in distinct
//! newtypes keeps a stop id from ever being passed where a trip id is
//! expected.

use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw feed identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type! {
    /// Identifier of a [`super::Stop`].
    StopId
}

id_type! {
    /// Identifier of a [`super::Route`].
    RouteId
}

id_type! {
    /// Identifier of a [`super::Trip`].
    TripId
}

id_type! {
    /// Identifier of a shape polyline.
    ShapeId
}
