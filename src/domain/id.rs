use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a monetary safe.
    SafeId
);
id_type!(
    /// Identifier of an immutable ledger transaction.
    TransactionId
);
id_type!(
    /// Identifier of a fee template.
    FeeId
);
id_type!(
    /// Identifier of a per-trainee payment obligation.
    PaymentId
);
id_type!(
    /// Identifier of a payment schedule attached to a fee.
    ScheduleId
);
id_type!(
    /// Identifier of a trainee enrolled in a program.
    TraineeId
);
id_type!(
    /// Identifier of a program.
    ProgramId
);
id_type!(
    /// Identifier of the acting user, used for audit fields.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_ordering() {
        assert_eq!(SafeId(7).to_string(), "7");
        assert!(SafeId(1) < SafeId(2));
    }

    #[test]
    fn test_id_serde_transparent() {
        let json = serde_json::to_string(&PaymentId(42)).unwrap();
        assert_eq!(json, "42");
        let back: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PaymentId(42));
    }
}
