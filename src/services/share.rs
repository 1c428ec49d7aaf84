use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ListKind, SharedList};
use crate::services::lists::ListStore;

/// Derives the share slug for a user's list.
///
/// Slugs are stable: sharing the same list twice yields the same link. The
/// user id and list kind are folded through two independent FNV-1a passes and
/// base36-encoded, giving an opaque lowercase token that fits in a URL path
/// segment. Distinct inputs colliding is about as likely as a UUID collision.
pub fn derive_slug(user_id: Uuid, kind: ListKind) -> String {
    let mut input = Vec::with_capacity(16 + kind.as_str().len());
    input.extend_from_slice(user_id.as_bytes());
    input.extend_from_slice(kind.as_str().as_bytes());

    let high = fnv1a(0xcbf2_9ce4_8422_2325, &input);
    let low = fnv1a(0x9e37_79b9_7f4a_7c15, &input);

    let mut slug = base36(high);
    slug.push_str(&base36(low));
    slug.truncate(16);
    slug
}

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}

/// Storage seam for slug -> (user, kind) mappings
#[async_trait::async_trait]
pub trait ShareStore: Send + Sync {
    /// Records the mapping; re-sharing an already shared list is a no-op
    async fn insert(&self, slug: &str, user_id: Uuid, kind: ListKind) -> AppResult<()>;

    /// Looks up which list a slug points at
    async fn resolve(&self, slug: &str) -> AppResult<Option<(Uuid, ListKind)>>;
}

/// Creates (or re-uses) the share link for the caller's list
pub async fn create_share(
    store: &dyn ShareStore,
    user_id: Uuid,
    kind: ListKind,
) -> AppResult<String> {
    let slug = derive_slug(user_id, kind);
    store.insert(&slug, user_id, kind).await?;

    tracing::info!(user_id = %user_id, kind = %kind, slug = %slug, "List shared");
    Ok(slug)
}

/// Resolves a slug into a read-only snapshot of the shared list
pub async fn resolve_share(
    share_store: &dyn ShareStore,
    list_store: &dyn ListStore,
    slug: &str,
) -> AppResult<SharedList> {
    let (user_id, kind) = share_store
        .resolve(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no shared list for '{}'", slug)))?;

    let entries = list_store.list_entries(user_id, kind).await?;

    Ok(SharedList {
        slug: slug.to_string(),
        kind,
        entries,
    })
}

/// PostgreSQL-backed share link storage
#[derive(Clone)]
pub struct PgShareStore {
    pool: PgPool,
}

impl PgShareStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ShareStore for PgShareStore {
    async fn insert(&self, slug: &str, user_id: Uuid, kind: ListKind) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO share_links (slug, user_id, kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(slug)
        .bind(user_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn resolve(&self, slug: &str) -> AppResult<Option<(Uuid, ListKind)>> {
        let row = sqlx::query("SELECT user_id, kind FROM share_links WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let kind: String = r.get("kind");
                let kind = kind
                    .parse::<ListKind>()
                    .map_err(AppError::Internal)?;
                Ok(Some((r.get("user_id"), kind)))
            }
            None => Ok(None),
        }
    }
}

/// In-memory share link storage for tests
#[derive(Default)]
pub struct MemoryShareStore {
    links: std::sync::Mutex<std::collections::HashMap<String, (Uuid, ListKind)>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ShareStore for MemoryShareStore {
    async fn insert(&self, slug: &str, user_id: Uuid, kind: ListKind) -> AppResult<()> {
        self.links
            .lock()
            .expect("share store poisoned")
            .entry(slug.to_string())
            .or_insert((user_id, kind));
        Ok(())
    }

    async fn resolve(&self, slug: &str) -> AppResult<Option<(Uuid, ListKind)>> {
        Ok(self
            .links
            .lock()
            .expect("share store poisoned")
            .get(slug)
            .copied())
    }
}
