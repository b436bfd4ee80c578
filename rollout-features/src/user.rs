//! The subject a feature is evaluated for.

/// Anything with a stable, non-negative integer identity.
///
/// Implementors must be `Sync` so that evaluation futures holding a
/// `&dyn User` are `Send`.
pub trait User: Sync {
    fn id(&self) -> u64;
}

impl User for u64 {
    fn id(&self) -> u64 {
        *self
    }
}

/// Bare user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl User for UserId {
    fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Canonical member string for a user in the users set.
pub(crate) fn member_id(user: &dyn User) -> String {
    user.id().to_string()
}
