use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// A user row about to be written. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
}

/// The `users` table. Email uniqueness is only checked by callers before
/// inserting; the table itself does not declare it.
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let _ = ensure_dir(path);
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                firstname TEXT NOT NULL,
                lastname TEXT NOT NULL,
                email TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn email_exists(&self, email: &str) -> rusqlite::Result<bool> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT 1 FROM users WHERE email = ?1 LIMIT 1")?;
        let found: Option<i64> = stmt.query_row(params![email], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }

    /// Inserts the user and returns its generated id.
    pub fn insert_user(&self, user: &NewUser) -> rusqlite::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        self.conn().execute(
            r#"
            INSERT INTO users (id, firstname, lastname, email, phone_number, password, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id,
                user.firstname,
                user.lastname,
                user.email,
                user.phone_number,
                user.password_hash,
                now
            ],
        )?;
        Ok(id)
    }

    #[cfg(test)]
    pub fn find_by_email(&self, email: &str) -> rusqlite::Result<Vec<StoredUser>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, firstname, lastname, email, phone_number, password FROM users WHERE email = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![email], |row| {
            Ok(StoredUser {
                id: row.get(0)?,
                firstname: row.get(1)?,
                lastname: row.get(2)?,
                email: row.get(3)?,
                phone_number: row.get(4)?,
                password_hash: row.get(5)?,
            })
        })?;
        let users = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn count(&self) -> rusqlite::Result<i64> {
        self.conn().query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str) -> NewUser {
        NewUser {
            firstname: "Ann".into(),
            lastname: "Lee".into(),
            email: email.into(),
            phone_number: "+1 5550100".into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[test]
    fn insert_then_lookup() {
        let store = UserStore::open_in_memory().unwrap();
        assert!(!store.email_exists("a@x.com").unwrap());

        let id = store.insert_user(&sample("a@x.com")).unwrap();
        assert!(store.email_exists("a@x.com").unwrap());
        assert!(!store.email_exists("b@x.com").unwrap());

        let found = store.find_by_email("a@x.com").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].phone_number, "+1 5550100");
    }

    #[test]
    fn table_does_not_enforce_unique_email() {
        let store = UserStore::open_in_memory().unwrap();
        store.insert_user(&sample("a@x.com")).unwrap();
        store.insert_user(&sample("a@x.com")).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.sqlite");
        {
            let store = UserStore::open(&path).unwrap();
            store.insert_user(&sample("a@x.com")).unwrap();
        }
        let store = UserStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
