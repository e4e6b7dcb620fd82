//! Idempotent upserts for users and their parent contacts.

use anyhow::{Context, Result};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::pin::hash_pin;
use crate::row::{ImportRow, RowError, clean};

/// How the user reconciler touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Inserted,
    Updated,
}

/// How the contact reconciler touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    Inserted,
    Updated,
    Skipped,
}

/// Insert or update the user identified by the row's alias.
///
/// Exactly one SELECT and one INSERT-or-UPDATE per call. Updates overwrite
/// every name field and the role, force `is_active`, and refresh
/// `updated_at`; the stored PIN hash is replaced only when the row carries a
/// PIN. Inserts require a PIN.
pub async fn upsert_user(conn: &mut PgConnection, row: &ImportRow) -> Result<(Uuid, UserAction)> {
    let user = row.validate()?;

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE alias = $1")
        .bind(user.alias)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to look up user by alias")?;

    let pin_hash = match user.pin {
        Some(pin) => Some(hash_pin(pin)?),
        None => None,
    };

    match existing {
        Some((id,)) => {
            sqlx::query(
                r#"
                UPDATE users
                SET first_name = $1,
                    middle_name = $2,
                    last_name = $3,
                    role = $4,
                    is_active = true,
                    updated_at = CURRENT_TIMESTAMP,
                    pin_hash = COALESCE($5, pin_hash)
                WHERE id = $6
                "#,
            )
            .bind(user.first_name)
            .bind(user.middle_name)
            .bind(user.last_name)
            .bind(user.role.as_str())
            .bind(pin_hash)
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to update user")?;
            Ok((id, UserAction::Updated))
        }
        None => {
            let pin_hash = pin_hash.ok_or(RowError::MissingPin)?;
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO users (id, first_name, middle_name, last_name, alias, role, pin_hash, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, true)
                "#,
            )
            .bind(id)
            .bind(user.first_name)
            .bind(user.middle_name)
            .bind(user.last_name)
            .bind(user.alias)
            .bind(user.role.as_str())
            .bind(pin_hash)
            .execute(&mut *conn)
            .await
            .context("Failed to insert user")?;
            Ok((id, UserAction::Inserted))
        }
    }
}

/// Insert, update, or skip the parent contact carried by the row.
///
/// Rows lacking a parent name or phone leave the store untouched. The
/// natural key is (user_id, phone_number); a recurring pair updates the
/// existing contact in place.
pub async fn upsert_parent_contact(
    conn: &mut PgConnection,
    user_id: Uuid,
    row: &ImportRow,
) -> Result<(Option<Uuid>, ContactAction)> {
    let (name, phone) = match (clean(&row.parent_name), clean(&row.parent_phone)) {
        (Some(name), Some(phone)) => (name, phone),
        _ => return Ok((None, ContactAction::Skipped)),
    };
    let relationship = clean(&row.parent_relationship);

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM parent_contacts WHERE user_id = $1 AND phone_number = $2")
            .bind(user_id)
            .bind(phone)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to look up parent contact")?;

    match existing {
        Some((id,)) => {
            sqlx::query(
                r#"
                UPDATE parent_contacts
                SET name = $1,
                    relationship = $2,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $3
                "#,
            )
            .bind(name)
            .bind(relationship)
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to update parent contact")?;
            Ok((Some(id), ContactAction::Updated))
        }
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO parent_contacts (id, user_id, name, phone_number, relationship)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(user_id)
            .bind(name)
            .bind(phone)
            .bind(relationship)
            .execute(&mut *conn)
            .await
            .context("Failed to insert parent contact")?;
            Ok((Some(id), ContactAction::Inserted))
        }
    }
}
