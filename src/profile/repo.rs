use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::UserRow;

impl UserRow {
    /// Find a user by ID.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, email, profile_pic, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Replace the stored picture reference.
    ///
    /// Returns the updated row together with the reference it replaced, or
    /// `None` when the user does not exist.
    pub async fn set_profile_pic(
        db: &PgPool,
        id: Uuid,
        profile_pic: Option<&str>,
    ) -> anyhow::Result<Option<(UserRow, Option<String>)>> {
        let mut tx = db.begin().await.context("begin tx")?;

        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            SELECT profile_pic
              FROM users
             WHERE id = $1
               FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock user row")?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET profile_pic = $2
             WHERE id = $1
            RETURNING id, full_name, email, profile_pic, created_at
            "#,
        )
        .bind(id)
        .bind(profile_pic) // None → NULL
        .fetch_one(&mut *tx)
        .await
        .context("update profile_pic")?;

        tx.commit().await.context("commit tx")?;
        Ok(Some((row, previous)))
    }
}
