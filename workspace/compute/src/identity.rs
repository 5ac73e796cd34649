use model::entities::user::Role;
use store::Store;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::{AccessError, Result};

/// Who is making a request. Passed explicitly to every access-layer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Loads the user behind an upstream-authenticated id. The stored role
    /// wins over anything the caller claims; unknown or inactive users are
    /// rejected.
    #[instrument(skip(store))]
    pub async fn resolve(store: &Store, user_id: Uuid) -> Result<Self> {
        match store.get_user(user_id).await? {
            Some(user) if user.is_active => Ok(Self::new(user.id, user.role)),
            Some(_) => {
                warn!(%user_id, "Inactive user presented");
                Err(AccessError::Unauthorized)
            }
            None => {
                warn!(%user_id, "Unknown user presented");
                Err(AccessError::Unauthorized)
            }
        }
    }
}
