//! User repository.

use std::sync::Arc;

use crate::entities::{user, User};
use osumod_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by their osu! id.
    pub async fn find_by_osu_id(&self, osu_id: i64) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::OsuId.eq(osu_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by lowercased display name.
    pub async fn find_by_username_lower(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by a display-name or osu!-id identifier.
    ///
    /// Underscores are treated as spaces and the name match is
    /// case-insensitive. When no name matches and the identifier is
    /// numeric, it is retried as an osu! id.
    pub async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<user::Model>> {
        let name = normalize_identifier(identifier);
        if let Some(user) = self.find_by_username_lower(&name).await? {
            return Ok(Some(user));
        }

        if let Ok(osu_id) = identifier.parse::<i64>() {
            return self.find_by_osu_id(osu_id).await;
        }

        Ok(None)
    }

    /// Find a user by session token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Queue URLs use underscores where display names have spaces.
fn normalize_identifier(identifier: &str) -> String {
    identifier.replace('_', " ").to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, osu_id: i64, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            osu_id,
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            country_code: "US".to_string(),
            avatar_url: None,
            token: Some(format!("token-{id}")),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_osu_id() {
        let user = create_test_user("u1", 124493, "Cookiezi");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_osu_id(124493).await.unwrap();
        assert_eq!(result.unwrap().username, "Cookiezi");
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("Some_Hero"), "some hero");
        assert_eq!(normalize_identifier("peppy"), "peppy");
    }

    #[tokio::test]
    async fn test_find_by_identifier_falls_back_to_osu_id() {
        let user = create_test_user("u1", 124493, "Cookiezi");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // No name match, then the osu!-id lookup hits.
                .append_query_results([Vec::<user::Model>::new(), vec![user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_identifier("124493").await.unwrap();
        assert_eq!(result.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }
}
