use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw identifier.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Returns true if the identifier was assigned (non-zero).
            pub const fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Identifier of an order row, assigned on persistence.
    ///
    /// Zero means "not assigned" and is rejected wherever an existing
    /// order is expected.
    OrderId
);

numeric_id!(
    /// Identifier of a customer row.
    CustomerId
);

numeric_id!(
    /// Identifier of a product row.
    ProductId
);

numeric_id!(
    /// Identifier of a payment row, owned by the payment service.
    PaymentId
);
