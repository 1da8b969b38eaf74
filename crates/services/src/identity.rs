use std::sync::RwLock;

use assess_core::model::UserId;

/// Source of the signed-in user.
///
/// Consulted when a session starts and again right before its attempt is saved.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}

/// Identity held in memory, switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    user: RwLock<Option<UserId>>,
}

impl StaticIdentity {
    #[must_use]
    pub fn new(user: Option<UserId>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self::new(Some(user))
    }

    pub fn sign_in(&self, user: UserId) {
        if let Ok(mut guard) = self.user.write() {
            *guard = Some(user);
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.user.write() {
            *guard = None;
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.user.read().ok().and_then(|guard| *guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn sign_in_and_out_switch_the_current_user() {
        let identity = StaticIdentity::default();
        assert_eq!(identity.current_user().await, None);

        let user = UserId::new(Uuid::from_u128(7));
        identity.sign_in(user);
        assert_eq!(identity.current_user().await, Some(user));

        identity.sign_out();
        assert_eq!(identity.current_user().await, None);
    }
}
