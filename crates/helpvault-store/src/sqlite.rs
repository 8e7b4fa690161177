//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Help Vault. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//! Foreign keys are enforced on every connection.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use helpvault_core::{
    ArticleId, Credential, Group, GroupId, GroupPermission, HelpArticle, Invitation,
    InvitationCode, NewHelpArticle, PermissionKind, Profile, RoleSet, SealedArticle, User,
    Username,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    CascadeReport, CreateGroupOutcome, GrantPlan, InsertResult, RedeemOutcome, RoleEdit,
    RoleEditOutcome, Store,
};

const USER_COLUMNS: &str = "username, credential, roles, email, first_name, middle_name, \
                            last_name, preferred_first_name, created_at";

const HELP_COLUMNS: &str = "id, title, description, short_description, authors, keywords, \
                            refs, level, group_name, created_at";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

// Helper to convert a row to User
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let username: String = row.get(0)?;
    let roles: String = row.get(2)?;

    Ok(User {
        username: Username::new(username).map_err(|e| conversion(0, e))?,
        credential: Credential::new(row.get::<_, String>(1)?),
        roles: RoleSet::from_column(&roles).map_err(|e| conversion(2, e))?,
        profile: Profile {
            email: row.get(3)?,
            first_name: row.get(4)?,
            middle_name: row.get(5)?,
            last_name: row.get(6)?,
            preferred_first_name: row.get(7)?,
        },
        created_at: row.get(8)?,
    })
}

fn row_to_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    let creator: String = row.get(2)?;
    Ok(Group {
        id: GroupId(row.get(0)?),
        name: row.get(1)?,
        creator: Username::new(creator).map_err(|e| conversion(2, e))?,
        created_at: row.get(3)?,
    })
}

fn row_to_permission(row: &Row<'_>) -> rusqlite::Result<GroupPermission> {
    let username: String = row.get(1)?;
    let kind: String = row.get(2)?;
    Ok(GroupPermission {
        group: GroupId(row.get(0)?),
        user: Username::new(username).map_err(|e| conversion(1, e))?,
        kind: kind.parse().map_err(|e| conversion(2, e))?,
    })
}

fn row_to_sealed(row: &Row<'_>) -> rusqlite::Result<SealedArticle> {
    Ok(SealedArticle {
        group: GroupId(row.get(0)?),
        article: ArticleId(row.get(1)?),
        sealed: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn row_to_help(row: &Row<'_>) -> rusqlite::Result<HelpArticle> {
    Ok(HelpArticle {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        short_description: row.get(3)?,
        authors: decode_list(4, &row.get::<_, Vec<u8>>(4)?)?,
        keywords: decode_list(5, &row.get::<_, Vec<u8>>(5)?)?,
        references: decode_list(6, &row.get::<_, Vec<u8>>(6)?)?,
        level: row.get(7)?,
        group_name: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// List columns are stored as CBOR arrays
fn encode_list(items: &[String]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(items, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_list(idx: usize, bytes: &[u8]) -> rusqlite::Result<Vec<String>> {
    ciborium::from_reader(bytes).map_err(|e| conversion(idx, e))
}

fn insert_outcome(result: rusqlite::Result<usize>) -> Result<InsertResult> {
    match result.map_err(StoreError::from) {
        Ok(_) => Ok(InsertResult::Inserted),
        Err(StoreError::UniqueViolation(_)) => Ok(InsertResult::AlreadyExists),
        Err(e) => Err(e),
    }
}

fn insert_user_row(conn: &Connection, user: &User) -> Result<InsertResult> {
    insert_outcome(conn.execute(
        "INSERT INTO users (
            username, credential, roles, email, first_name, middle_name,
            last_name, preferred_first_name, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.username.as_str(),
            user.credential.expose(),
            user.roles.to_column(),
            user.profile.email,
            user.profile.first_name,
            user.profile.middle_name,
            user.profile.last_name,
            user.profile.preferred_first_name,
            user.created_at,
        ],
    ))
}

fn insert_permission_row(
    conn: &Connection,
    group: GroupId,
    user: &Username,
    kind: PermissionKind,
    now: i64,
) -> Result<InsertResult> {
    insert_outcome(conn.execute(
        "INSERT INTO group_permissions (group_id, username, kind, granted_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![group.0, user.as_str(), kind.as_str(), now],
    ))
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<InsertResult> {
        let user = user.clone();
        self.call(move |conn| insert_user_row(conn, &user)).await
    }

    async fn get_user(&self, username: &Username) -> Result<Option<User>> {
        let username = username.clone();

        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username.as_str()],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn user_exists(&self, username: &Username) -> Result<bool> {
        let username = username.clone();

        self.call(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
                params![username.as_str()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn count_users(&self) -> Result<u64> {
        self.call(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
            let users = stmt
                .query_map([], row_to_user)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
    }

    async fn edit_roles(&self, username: &Username, edit: &RoleEdit) -> Result<RoleEditOutcome> {
        let username = username.clone();
        let edit = edit.clone();

        self.call(move |conn| {
            let tx = conn.transaction()?;

            let column: Option<String> = tx
                .query_row(
                    "SELECT roles FROM users WHERE username = ?1",
                    params![username.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(column) = column else {
                return Ok(RoleEditOutcome::UnknownUser);
            };

            let mut roles = RoleSet::from_column(&column)
                .map_err(|e| StoreError::InvalidData(format!("roles of {username}: {e}")))?;
            let outcome = match edit.apply(&mut roles) {
                Ok(true) => {
                    tx.execute(
                        "UPDATE users SET roles = ?2 WHERE username = ?1",
                        params![username.as_str(), roles.to_column()],
                    )?;
                    RoleEditOutcome::Changed(roles)
                }
                Ok(false) => RoleEditOutcome::Unchanged,
                Err(e) => RoleEditOutcome::Rejected(e),
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
    }

    async fn reset(&self) -> Result<()> {
        self.call(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "DELETE FROM group_permissions;
                 DELETE FROM encrypted_articles;
                 DELETE FROM access_groups;
                 DELETE FROM invitations;
                 DELETE FROM users;
                 DELETE FROM help_articles;
                 DELETE FROM sqlite_sequence;",
            )?;
            tx.commit()?;
            tracing::warn!("store reset");
            Ok(())
        })
        .await
    }

    async fn update_profile(&self, username: &Username, profile: &Profile) -> Result<bool> {
        let username = username.clone();
        let profile = profile.clone();

        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET email = ?2, first_name = ?3, middle_name = ?4,
                        last_name = ?5, preferred_first_name = ?6
                 WHERE username = ?1",
                params![
                    username.as_str(),
                    profile.email,
                    profile.first_name,
                    profile.middle_name,
                    profile.last_name,
                    profile.preferred_first_name,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_user(&self, username: &Username) -> Result<bool> {
        let username = username.clone();

        self.call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM group_permissions WHERE username = ?1",
                params![username.as_str()],
            )?;
            let deleted = tx.execute(
                "DELETE FROM users WHERE username = ?1",
                params![username.as_str()],
            )?;
            tx.commit()?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_invitation(&self, invitation: &Invitation) -> Result<InsertResult> {
        let invitation = invitation.clone();

        self.call(move |conn| {
            insert_outcome(conn.execute(
                "INSERT INTO invitations (code, role, issued_at) VALUES (?1, ?2, ?3)",
                params![
                    invitation.code.as_str(),
                    invitation.role,
                    invitation.issued_at
                ],
            ))
        })
        .await
    }

    async fn get_invitation(&self, code: &InvitationCode) -> Result<Option<Invitation>> {
        let code = code.clone();

        self.call(move |conn| {
            let row: Option<(String, i64)> = conn
                .query_row(
                    "SELECT role, issued_at FROM invitations WHERE code = ?1",
                    params![code.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            Ok(row.map(|(role, issued_at)| Invitation {
                code,
                role,
                issued_at,
            }))
        })
        .await
    }

    async fn delete_invitation(&self, code: &InvitationCode) -> Result<bool> {
        let code = code.clone();

        self.call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM invitations WHERE code = ?1",
                params![code.as_str()],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn redeem_invitation(
        &self,
        code: &InvitationCode,
        username: &Username,
        credential: &Credential,
        now: i64,
    ) -> Result<RedeemOutcome> {
        let code = code.clone();
        let username = username.clone();
        let credential = credential.clone();

        self.call(move |conn| {
            let tx = conn.transaction()?;

            let role: Option<String> = tx
                .query_row(
                    "SELECT role FROM invitations WHERE code = ?1",
                    params![code.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(role) = role else {
                return Ok(RedeemOutcome::UnknownCode);
            };

            let roles = RoleSet::single(&role)
                .map_err(|e| StoreError::InvalidData(format!("invitation role: {e}")))?;
            let user = User::new(username, credential, roles, now);

            // Dropping the transaction rolls back; the code stays valid
            if insert_user_row(&tx, &user)? == InsertResult::AlreadyExists {
                return Ok(RedeemOutcome::UsernameTaken);
            }

            tx.execute(
                "DELETE FROM invitations WHERE code = ?1",
                params![code.as_str()],
            )?;
            tx.commit()?;

            Ok(RedeemOutcome::Redeemed(user))
        })
        .await
    }

    async fn create_group(
        &self,
        name: &str,
        creator: &Username,
        creator_grants: &[PermissionKind],
        now: i64,
    ) -> Result<CreateGroupOutcome> {
        let name = name.to_string();
        let creator = creator.clone();
        let grants = creator_grants.to_vec();

        self.call(move |conn| {
            let tx = conn.transaction()?;

            let inserted = insert_outcome(tx.execute(
                "INSERT INTO access_groups (name, creator, created_at) VALUES (?1, ?2, ?3)",
                params![name, creator.as_str(), now],
            ))?;
            if inserted == InsertResult::AlreadyExists {
                return Ok(CreateGroupOutcome::NameTaken);
            }

            let id = GroupId(tx.last_insert_rowid());
            for kind in grants {
                insert_permission_row(&tx, id, &creator, kind, now)?;
            }
            tx.commit()?;

            Ok(CreateGroupOutcome::Created(Group {
                id,
                name,
                creator,
                created_at: now,
            }))
        })
        .await
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT group_id, name, creator, created_at FROM access_groups
                 WHERE group_id = ?1",
                params![id.0],
                row_to_group,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let name = name.to_string();

        self.call(move |conn| {
            conn.query_row(
                "SELECT group_id, name, creator, created_at FROM access_groups WHERE name = ?1",
                params![name],
                row_to_group,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id, name, creator, created_at FROM access_groups
                 ORDER BY group_id",
            )?;
            let groups = stmt
                .query_map([], row_to_group)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
        .await
    }

    async fn delete_group_cascade(&self, id: GroupId) -> Result<Option<CascadeReport>> {
        self.call(move |conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM access_groups WHERE group_id = ?1)",
                params![id.0],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            // Order matters: rows referencing the group go first
            let permissions = tx.execute(
                "DELETE FROM group_permissions WHERE group_id = ?1",
                params![id.0],
            )?;
            let articles = tx.execute(
                "DELETE FROM encrypted_articles WHERE group_id = ?1",
                params![id.0],
            )?;
            tx.execute(
                "DELETE FROM access_groups WHERE group_id = ?1",
                params![id.0],
            )?;
            tx.commit()?;

            Ok(Some(CascadeReport {
                permissions,
                articles,
            }))
        })
        .await
    }

    async fn insert_permission(&self, permission: &GroupPermission) -> Result<InsertResult> {
        let permission = permission.clone();

        self.call(move |conn| {
            insert_permission_row(
                conn,
                permission.group,
                &permission.user,
                permission.kind,
                helpvault_core::now_millis(),
            )
        })
        .await
    }

    async fn delete_permission(&self, permission: &GroupPermission) -> Result<bool> {
        let permission = permission.clone();

        self.call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM group_permissions
                 WHERE group_id = ?1 AND username = ?2 AND kind = ?3",
                params![
                    permission.group.0,
                    permission.user.as_str(),
                    permission.kind.as_str()
                ],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn has_permission(&self, permission: &GroupPermission) -> Result<bool> {
        let permission = permission.clone();

        self.call(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM group_permissions
                 WHERE group_id = ?1 AND username = ?2 AND kind = ?3)",
                params![
                    permission.group.0,
                    permission.user.as_str(),
                    permission.kind.as_str()
                ],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn list_permissions(&self, group: GroupId) -> Result<Vec<GroupPermission>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id, username, kind FROM group_permissions
                 WHERE group_id = ?1 ORDER BY username, kind",
            )?;
            let rows = stmt
                .query_map(params![group.0], row_to_permission)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn list_group_members(
        &self,
        group: GroupId,
        kind: PermissionKind,
    ) -> Result<Vec<Username>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT username FROM group_permissions
                 WHERE group_id = ?1 AND kind = ?2 ORDER BY username",
            )?;
            let names = stmt
                .query_map(params![group.0, kind.as_str()], |row| {
                    let name: String = row.get(0)?;
                    Username::new(name).map_err(|e| conversion(0, e))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })
        .await
    }

    async fn list_user_groups(
        &self,
        user: &Username,
        kind: PermissionKind,
    ) -> Result<Vec<GroupId>> {
        let user = user.clone();

        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id FROM group_permissions
                 WHERE username = ?1 AND kind = ?2 ORDER BY group_id",
            )?;
            let groups = stmt
                .query_map(params![user.as_str(), kind.as_str()], |row| {
                    Ok(GroupId(row.get(0)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(groups)
        })
        .await
    }

    async fn grant_planned(
        &self,
        group: GroupId,
        user: &Username,
        plan: GrantPlan,
    ) -> Result<Vec<PermissionKind>> {
        let user = user.clone();

        self.call(move |conn| {
            let tx = conn.transaction()?;
            let now = helpvault_core::now_millis();

            let has_admin: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM group_permissions
                 WHERE group_id = ?1 AND kind = 'ADMIN')",
                params![group.0],
                |row| row.get(0),
            )?;

            let mut granted = Vec::new();
            for &kind in plan(has_admin) {
                if insert_permission_row(&tx, group, &user, kind, now)? == InsertResult::Inserted {
                    granted.push(kind);
                }
            }
            tx.commit()?;

            Ok(granted)
        })
        .await
    }

    async fn upsert_sealed_article(&self, article: &SealedArticle) -> Result<()> {
        let article = article.clone();

        self.call(move |conn| {
            conn.execute(
                "INSERT INTO encrypted_articles (group_id, article_id, sealed, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (group_id, article_id)
                 DO UPDATE SET sealed = excluded.sealed, updated_at = excluded.updated_at",
                params![
                    article.group.0,
                    article.article.0,
                    article.sealed,
                    article.updated_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_sealed_article(
        &self,
        group: GroupId,
        article: ArticleId,
    ) -> Result<Option<SealedArticle>> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT group_id, article_id, sealed, updated_at FROM encrypted_articles
                 WHERE group_id = ?1 AND article_id = ?2",
                params![group.0, article.0],
                row_to_sealed,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_sealed_articles(&self, group: Option<GroupId>) -> Result<Vec<SealedArticle>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT group_id, article_id, sealed, updated_at FROM encrypted_articles
                 WHERE ?1 IS NULL OR group_id = ?1
                 ORDER BY group_id, article_id",
            )?;
            let rows = stmt
                .query_map(params![group.map(|g| g.0)], row_to_sealed)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn delete_sealed_article(&self, group: GroupId, article: ArticleId) -> Result<bool> {
        self.call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM encrypted_articles WHERE group_id = ?1 AND article_id = ?2",
                params![group.0, article.0],
            )?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_help_article(
        &self,
        item: &NewHelpArticle,
        now: i64,
    ) -> Result<Option<HelpArticle>> {
        let item = item.clone();

        self.call(move |conn| {
            let inserted = insert_outcome(conn.execute(
                "INSERT INTO help_articles (
                    title, description, short_description, authors, keywords,
                    refs, level, group_name, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    item.title,
                    item.description,
                    item.short_description,
                    encode_list(&item.authors)?,
                    encode_list(&item.keywords)?,
                    encode_list(&item.references)?,
                    item.level,
                    item.group_name,
                    now,
                ],
            ))?;
            if inserted == InsertResult::AlreadyExists {
                return Ok(None);
            }

            Ok(Some(HelpArticle {
                id: conn.last_insert_rowid(),
                title: item.title,
                description: item.description,
                short_description: item.short_description,
                authors: item.authors,
                keywords: item.keywords,
                references: item.references,
                level: item.level,
                group_name: item.group_name,
                created_at: now,
            }))
        })
        .await
    }

    async fn get_help_article(&self, title: &str) -> Result<Option<HelpArticle>> {
        let title = title.to_string();

        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {HELP_COLUMNS} FROM help_articles WHERE title = ?1"),
                params![title],
                row_to_help,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_help_articles(&self) -> Result<Vec<HelpArticle>> {
        self.call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {HELP_COLUMNS} FROM help_articles ORDER BY id"))?;
            let rows = stmt
                .query_map([], row_to_help)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn delete_help_article(&self, title: &str) -> Result<bool> {
        let title = title.to_string();

        self.call(move |conn| {
            let deleted =
                conn.execute("DELETE FROM help_articles WHERE title = ?1", params![title])?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpvault_core::Role;

    fn name(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    fn perm(group: GroupId, user: &str, kind: PermissionKind) -> GroupPermission {
        GroupPermission {
            group,
            user: name(user),
            kind,
        }
    }

    fn both(_: bool) -> &'static [PermissionKind] {
        &[PermissionKind::Admin, PermissionKind::View]
    }

    fn first_instructor(has_admin: bool) -> &'static [PermissionKind] {
        if has_admin {
            &[PermissionKind::View]
        } else {
            &[PermissionKind::Admin, PermissionKind::View]
        }
    }

    async fn make_group(store: &SqliteStore, group: &str, creator: &str) -> Group {
        match store
            .create_group(group, &name(creator), both(false), 1000)
            .await
            .unwrap()
        {
            CreateGroupOutcome::Created(g) => g,
            CreateGroupOutcome::NameTaken => panic!("name taken"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_user() {
        let store = SqliteStore::open_memory().unwrap();
        let user = User::new(
            name("alice"),
            Credential::new("pw"),
            RoleSet::from_labels([Role::ADMIN, Role::STUDENT]).unwrap(),
            42,
        );

        assert_eq!(store.insert_user(&user).await.unwrap(), InsertResult::Inserted);
        assert_eq!(
            store.insert_user(&user).await.unwrap(),
            InsertResult::AlreadyExists
        );

        let loaded = store.get_user(&name("alice")).await.unwrap().unwrap();
        assert_eq!(loaded, user);
        assert!(store.user_exists(&name("alice")).await.unwrap());
        assert!(!store.user_exists(&name("bob")).await.unwrap());
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_redeem_consumes_code_once() {
        let store = SqliteStore::open_memory().unwrap();
        let code = InvitationCode::parse("ZX7KQ1MNPQ").unwrap();
        store
            .insert_invitation(&Invitation {
                code: code.clone(),
                role: Role::INSTRUCTOR.into(),
                issued_at: 1,
            })
            .await
            .unwrap();

        let first = store
            .redeem_invitation(&code, &name("bob"), &Credential::new("pw1"), 2)
            .await
            .unwrap();
        let RedeemOutcome::Redeemed(bob) = first else {
            panic!("expected redemption, got {first:?}");
        };
        assert!(bob.has_role(Role::INSTRUCTOR));
        assert!(store.get_invitation(&code).await.unwrap().is_none());

        let second = store
            .redeem_invitation(&code, &name("eve"), &Credential::new("pw2"), 3)
            .await
            .unwrap();
        assert_eq!(second, RedeemOutcome::UnknownCode);
    }

    #[tokio::test]
    async fn test_redeem_with_taken_username_keeps_code() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .insert_user(&User::new(
                name("bob"),
                Credential::new("x"),
                RoleSet::single(Role::STUDENT).unwrap(),
                0,
            ))
            .await
            .unwrap();

        let code = InvitationCode::parse("ABCDEFGHIJ").unwrap();
        store
            .insert_invitation(&Invitation {
                code: code.clone(),
                role: Role::STUDENT.into(),
                issued_at: 1,
            })
            .await
            .unwrap();

        let outcome = store
            .redeem_invitation(&code, &name("bob"), &Credential::new("y"), 2)
            .await
            .unwrap();
        assert_eq!(outcome, RedeemOutcome::UsernameTaken);
        assert!(store.get_invitation(&code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_group_bootstraps_creator() {
        let store = SqliteStore::open_memory().unwrap();
        let group = make_group(&store, "CS101", "alice").await;

        let rows = store.list_permissions(group.id).await.unwrap();
        assert_eq!(
            rows,
            vec![
                perm(group.id, "alice", PermissionKind::Admin),
                perm(group.id, "alice", PermissionKind::View),
            ]
        );

        let dup = store
            .create_group("CS101", &name("bob"), both(false), 2000)
            .await
            .unwrap();
        assert_eq!(dup, CreateGroupOutcome::NameTaken);
    }

    #[tokio::test]
    async fn test_permission_insert_is_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let group = make_group(&store, "CS101", "alice").await;
        let p = perm(group.id, "carol", PermissionKind::View);

        assert_eq!(store.insert_permission(&p).await.unwrap(), InsertResult::Inserted);
        assert_eq!(
            store.insert_permission(&p).await.unwrap(),
            InsertResult::AlreadyExists
        );
        assert_eq!(
            store
                .list_group_members(group.id, PermissionKind::View)
                .await
                .unwrap(),
            vec![name("alice"), name("carol")]
        );

        assert!(store.delete_permission(&p).await.unwrap());
        assert!(!store.delete_permission(&p).await.unwrap());
    }

    #[tokio::test]
    async fn test_permission_for_missing_group_is_referential_violation() {
        let store = SqliteStore::open_memory().unwrap();
        let err = store
            .insert_permission(&perm(GroupId(77), "carol", PermissionKind::View))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReferentialViolation(_)));
    }

    #[tokio::test]
    async fn test_grant_planned_first_instructor() {
        let store = SqliteStore::open_memory().unwrap();
        let group = match store
            .create_group("Lab", &name("root"), &[PermissionKind::View], 1)
            .await
            .unwrap()
        {
            CreateGroupOutcome::Created(g) => g,
            other => panic!("{other:?}"),
        };

        let first = store
            .grant_planned(group.id, &name("ivy"), first_instructor)
            .await
            .unwrap();
        assert_eq!(first, vec![PermissionKind::Admin, PermissionKind::View]);

        let second = store
            .grant_planned(group.id, &name("jon"), first_instructor)
            .await
            .unwrap();
        assert_eq!(second, vec![PermissionKind::View]);
    }

    #[tokio::test]
    async fn test_delete_group_cascade() {
        let store = SqliteStore::open_memory().unwrap();
        let group = make_group(&store, "CS101", "alice").await;
        store
            .upsert_sealed_article(&SealedArticle {
                group: group.id,
                article: ArticleId(1),
                sealed: "AAAA:BBBB".into(),
                updated_at: 5,
            })
            .await
            .unwrap();

        let report = store.delete_group_cascade(group.id).await.unwrap().unwrap();
        assert_eq!(
            report,
            CascadeReport {
                permissions: 2,
                articles: 1
            }
        );
        assert!(store.get_group(group.id).await.unwrap().is_none());
        assert!(store.list_permissions(group.id).await.unwrap().is_empty());
        assert!(store
            .list_sealed_articles(Some(group.id))
            .await
            .unwrap()
            .is_empty());

        assert!(store.delete_group_cascade(group.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_out_of_order_group_delete_is_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        let group = make_group(&store, "CS101", "alice").await;

        let conn = store.conn.lock().unwrap();
        let result = conn.execute(
            "DELETE FROM access_groups WHERE group_id = ?1",
            params![group.id.0],
        );
        assert!(matches!(
            result.map_err(StoreError::from),
            Err(StoreError::ReferentialViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_removes_permissions() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .insert_user(&User::new(
                name("alice"),
                Credential::new("pw"),
                RoleSet::single(Role::INSTRUCTOR).unwrap(),
                0,
            ))
            .await
            .unwrap();
        let group = make_group(&store, "CS101", "alice").await;

        assert!(store.delete_user(&name("alice")).await.unwrap());
        assert!(store.list_permissions(group.id).await.unwrap().is_empty());
        assert!(!store.delete_user(&name("alice")).await.unwrap());
    }

    #[tokio::test]
    async fn test_help_articles_round_trip_lists() {
        let store = SqliteStore::open_memory().unwrap();
        let item = NewHelpArticle::new("Title1", "Desc1")
            .author("Author1")
            .author("Author2")
            .keyword("Keyword1")
            .reference("Ref1")
            .level("Beginner")
            .group_name("Group1");

        let stored = store.insert_help_article(&item, 9).await.unwrap().unwrap();
        assert!(store.insert_help_article(&item, 10).await.unwrap().is_none());

        let loaded = store.get_help_article("Title1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.authors, vec!["Author1", "Author2"]);

        assert!(store.delete_help_article("Title1").await.unwrap());
        assert!(store.list_help_articles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            make_group(&store, "CS101", "alice").await;
        }

        let store = SqliteStore::open(&path).unwrap();
        let group = store.get_group_by_name("CS101").await.unwrap().unwrap();
        assert_eq!(group.creator, name("alice"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn list_column_preserves_items(items in prop::collection::vec(".{0,16}", 0..8)) {
                let bytes = encode_list(&items).unwrap();
                prop_assert_eq!(decode_list(0, &bytes).unwrap(), items);
            }

            #[test]
            fn garbage_list_column_is_an_error_not_a_panic(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
                let _ = decode_list(0, &bytes);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_role_edits_all_land() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let sam = name("sam");
        store
            .insert_user(&User::new(
                sam.clone(),
                Credential::new("pw"),
                RoleSet::single(Role::STUDENT).unwrap(),
                0,
            ))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let sam = sam.clone();
            handles.push(tokio::spawn(async move {
                store
                    .edit_roles(&sam, &RoleEdit::Add(format!("R{i}")))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(matches!(handle.await.unwrap(), RoleEditOutcome::Changed(_)));
        }

        let roles = store.get_user(&sam).await.unwrap().unwrap().roles;
        assert_eq!(roles.len(), 9);
        for i in 0..8 {
            assert!(roles.contains(&format!("R{i}")));
        }
    }

    #[tokio::test]
    async fn test_reset_keeps_schema() {
        let store = SqliteStore::open_memory().unwrap();
        let CreateGroupOutcome::Created(g) = store
            .create_group("CS101", &name("alice"), both(false), 0)
            .await
            .unwrap()
        else {
            panic!("expected creation");
        };
        store
            .upsert_sealed_article(&SealedArticle {
                group: g.id,
                article: ArticleId(1),
                sealed: "AAAA:BBBB".into(),
                updated_at: 0,
            })
            .await
            .unwrap();

        store.reset().await.unwrap();
        assert!(store.list_groups().await.unwrap().is_empty());
        assert!(store.list_sealed_articles(None).await.unwrap().is_empty());

        let CreateGroupOutcome::Created(again) = store
            .create_group("CS101", &name("alice"), both(false), 0)
            .await
            .unwrap()
        else {
            panic!("expected creation");
        };
        assert_eq!(store.list_permissions(again.id).await.unwrap().len(), 2);
    }
}
