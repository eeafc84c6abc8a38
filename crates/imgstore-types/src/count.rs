use std::fmt;

use serde::{Deserialize, Serialize};

/// Two-tier reference count for a stored image.
///
/// `confirmed` tracks references that are definitely in use, `unconfirmed`
/// those that are only tentatively in use (a draft that may be discarded).
/// The store never interprets the tiers; it only cares whether both are zero,
/// in which case the image may be pruned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Count {
    pub confirmed: u64,
    pub unconfirmed: u64,
}

impl Count {
    /// The zero count. A ledger entry at zero is a prune candidate.
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(confirmed: u64, unconfirmed: u64) -> Self {
        Self {
            confirmed,
            unconfirmed,
        }
    }

    /// A single confirmed reference.
    pub const fn confirmed(n: u64) -> Self {
        Self::new(n, 0)
    }

    /// A single unconfirmed reference.
    pub const fn unconfirmed(n: u64) -> Self {
        Self::new(0, n)
    }

    /// Returns `true` if neither tier holds a reference.
    pub fn is_zero(&self) -> bool {
        self.confirmed == 0 && self.unconfirmed == 0
    }

    /// Component-wise subtraction. `None` if either tier would go negative.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        Some(Self {
            confirmed: self.confirmed.checked_sub(rhs.confirmed)?,
            unconfirmed: self.unconfirmed.checked_sub(rhs.unconfirmed)?,
        })
    }

    /// Component-wise addition. `None` if either tier would overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self {
            confirmed: self.confirmed.checked_add(rhs.confirmed)?,
            unconfirmed: self.unconfirmed.checked_add(rhs.unconfirmed)?,
        })
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.confirmed, self.unconfirmed)
    }
}
