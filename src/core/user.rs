use log::info;

use crate::core::db::{Storer, UserCommon};
use crate::error::Error;

#[derive(Debug)]
pub struct EnsureUserOutcome {
    pub user_id: i32,
    pub created: bool,
}

/// Creates a user keyed by email, idempotently: a duplicate create returns
/// the existing id instead of erroring or duplicating the row.
pub async fn ensure_user<D>(db: &mut D, email: &str) -> Result<EnsureUserOutcome, Error>
where
    D: Storer,
{
    if let Some(user) = UserCommon::get_by_email(db, email).await? {
        return Ok(EnsureUserOutcome {
            user_id: user.id,
            created: false,
        });
    }
    let user_id = UserCommon::insert(db, email).await?;
    info!("user {} created", user_id);
    Ok(EnsureUserOutcome { user_id, created: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Manager;
    use crate::core::testing::MemManager;

    #[tokio::test]
    async fn creation_is_idempotent_by_email() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();

        let first = ensure_user(&mut db, "a@example.com").await.unwrap();
        assert!(first.created);
        let second = ensure_user(&mut db, "a@example.com").await.unwrap();
        assert!(!second.created);
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(manager.mutate(|state| state.user_count()), 1);

        let other = ensure_user(&mut db, "b@example.com").await.unwrap();
        assert!(other.created);
        assert_ne!(other.user_id, first.user_id);
    }
}
