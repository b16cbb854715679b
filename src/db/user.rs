use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::{PgStore, UserRepository};
use crate::{errors::AppError, models::User};

#[async_trait]
impl UserRepository for PgStore {
    async fn find_names(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(self.pool())
            .await?;
        Ok(users.into_iter().map(|user| (user.id, user.name)).collect())
    }
}
