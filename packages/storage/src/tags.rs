// ABOUTME: Tag attachment helpers shared by task and project storage
// ABOUTME: Tags are created on first use and joined through per-entity tables

use sqlx::{Row, SqliteConnection};

use crate::{StorageError, StorageResult};

/// Get or create the tag named `name`, returning its id.
pub(crate) async fn ensure_tag(conn: &mut SqliteConnection, name: &str) -> StorageResult<String> {
    if let Some(row) = sqlx::query("SELECT id FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
    {
        return Ok(row.try_get("id")?);
    }

    let id = taskhive_core::entity_id("tag");
    sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?)")
        .bind(&id)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(id)
}

/// Replace the tag set attached through `join_table` (`task_tags` or
/// `project_tags`) for the entity in `entity_column`.
pub(crate) async fn replace_tags(
    conn: &mut SqliteConnection,
    join_table: &str,
    entity_column: &str,
    entity_id: &str,
    names: &[String],
) -> StorageResult<()> {
    let delete = format!("DELETE FROM {} WHERE {} = ?", join_table, entity_column);
    sqlx::query(&delete)
        .bind(entity_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} ({}, tag_id) VALUES (?, ?)",
        join_table, entity_column
    );

    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let tag_id = ensure_tag(conn, name).await?;
        sqlx::query(&insert)
            .bind(entity_id)
            .bind(&tag_id)
            .execute(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;
    }

    Ok(())
}
