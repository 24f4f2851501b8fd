//! Ticket repository for database operations.
//!
//! List queries resolve queue and user names in one pass; filters are
//! composed with `QueryBuilder` push-binds so no client input ever reaches
//! the SQL text.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use ticketslave_core::{Priority, QueueId, TicketId, TicketStatus, UserId, Username};

use super::RepositoryError;
use crate::models::Ticket;

/// Internal row type for ticket queries with joined display names.
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    title: String,
    description: String,
    status: TicketStatus,
    priority: Priority,
    deadline: Option<DateTime<Utc>>,
    queue_id: i64,
    queue_name: String,
    created_by: i64,
    creator_username: String,
    assigned_to: Option<i64>,
    assignee_username: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let creator_username = Username::parse(&row.creator_username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let assignee_username = row
            .assignee_username
            .as_deref()
            .map(Username::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
            })?;

        Ok(Self {
            id: TicketId::new(row.id),
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            deadline: row.deadline,
            queue_id: QueueId::new(row.queue_id),
            queue_name: row.queue_name,
            created_by: UserId::new(row.created_by),
            creator_username,
            assigned_to: row.assigned_to.map(UserId::new),
            assignee_username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TICKET_SELECT: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, \
    t.deadline, t.queue_id, q.name AS queue_name, \
    t.created_by, cu.username AS creator_username, \
    t.assigned_to, au.username AS assignee_username, \
    t.created_at, t.updated_at \
    FROM tickets t \
    JOIN queues q ON q.id = t.queue_id \
    JOIN users cu ON cu.id = t.created_by \
    LEFT JOIN users au ON au.id = t.assigned_to";

/// Fields for a new ticket. Status always starts as `open`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub queue_id: QueueId,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
}

/// The full mutable column set written by an update.
///
/// The domain service loads the current ticket, applies the requested patch
/// in memory (with permission and transition checks), and hands the final
/// values here.
#[derive(Debug, Clone)]
pub struct TicketChanges {
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub queue_id: QueueId,
    pub assigned_to: Option<UserId>,
}

/// Filters for ticket listing. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketFilter {
    pub queue_id: Option<QueueId>,
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<UserId>,
}

impl TicketFilter {
    fn push_where(self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(queue_id) = self.queue_id {
            qb.push(" AND t.queue_id = ");
            qb.push_bind(queue_id);
        }
        if let Some(status) = self.status {
            qb.push(" AND t.status = ");
            qb.push_bind(status);
        }
        if let Some(assigned_to) = self.assigned_to {
            qb.push(" AND t.assigned_to = ");
            qb.push_bind(assigned_to);
        }
    }
}

/// Repository for ticket database operations.
pub struct TicketRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TicketRepository<'a> {
    /// Create a new ticket repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new ticket in `open` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// foreign key violations for a missing queue or user).
    pub async fn create(&self, new: &NewTicket) -> Result<Ticket, RepositoryError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO tickets \
             (title, description, status, priority, deadline, queue_id, created_by, assigned_to, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(TicketStatus::Open)
        .bind(new.priority)
        .bind(new.deadline)
        .bind(new.queue_id)
        .bind(new.created_by)
        .bind(new.assigned_to)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(TicketId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a ticket by its ID, with queue and user names resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let row: Option<TicketRow> = sqlx::query_as(&format!("{TICKET_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List tickets matching a filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(
        &self,
        filter: TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("{TICKET_SELECT} WHERE 1 = 1"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows: Vec<TicketRow> = qb.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Count tickets matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: TicketFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets t WHERE 1 = 1");
        filter.push_where(&mut qb);

        let count: i64 = qb.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Overwrite a ticket's mutable columns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: TicketId,
        changes: &TicketChanges,
    ) -> Result<Ticket, RepositoryError> {
        let result = sqlx::query(
            "UPDATE tickets SET title = ?, description = ?, status = ?, priority = ?, \
             deadline = ?, queue_id = ?, assigned_to = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.deadline)
        .bind(changes.queue_id)
        .bind(changes.assigned_to)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a ticket. Comments and attachment rows cascade in the schema;
    /// attachment files are the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: TicketId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use crate::db::{QueueRepository, UserRepository};
    use ticketslave_core::Role;

    async fn seed(pool: &SqlitePool) -> (UserId, QueueId) {
        let user = UserRepository::new(pool)
            .create(&Username::parse("alice").unwrap(), "hash", Role::Regular)
            .await
            .unwrap();
        let queue = QueueRepository::new(pool).create("IT", "").await.unwrap();
        (user.id, queue.id)
    }

    fn new_ticket(title: &str, queue_id: QueueId, created_by: UserId) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            deadline: None,
            queue_id,
            created_by,
            assigned_to: None,
        }
    }

    #[tokio::test]
    async fn test_create_resolves_names() {
        let (pool, _tmp) = test_pool().await;
        let (user_id, queue_id) = seed(&pool).await;
        let repo = TicketRepository::new(&pool);

        let ticket = repo
            .create(&new_ticket("Printer broken", queue_id, user_id))
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.queue_name, "IT");
        assert_eq!(ticket.creator_username.as_str(), "alice");
        assert!(ticket.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (pool, _tmp) = test_pool().await;
        let (user_id, queue_id) = seed(&pool).await;
        let other_queue = QueueRepository::new(&pool)
            .create("Facilities", "")
            .await
            .unwrap();
        let repo = TicketRepository::new(&pool);

        repo.create(&new_ticket("a", queue_id, user_id)).await.unwrap();
        repo.create(&new_ticket("b", queue_id, user_id)).await.unwrap();
        repo.create(&new_ticket("c", other_queue.id, user_id))
            .await
            .unwrap();

        let filter = TicketFilter {
            queue_id: Some(queue_id),
            ..TicketFilter::default()
        };
        assert_eq!(repo.count(filter).await.unwrap(), 2);
        assert_eq!(repo.list(filter, 50, 0).await.unwrap().len(), 2);

        let by_assignee = TicketFilter {
            assigned_to: Some(user_id),
            ..TicketFilter::default()
        };
        assert_eq!(repo.count(by_assignee).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_pagination() {
        let (pool, _tmp) = test_pool().await;
        let (user_id, queue_id) = seed(&pool).await;
        let repo = TicketRepository::new(&pool);

        for i in 0..5 {
            repo.create(&new_ticket(&format!("t{i}"), queue_id, user_id))
                .await
                .unwrap();
        }

        let page = repo.list(TicketFilter::default(), 2, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(repo.list(TicketFilter::default(), 2, 4).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (pool, _tmp) = test_pool().await;
        let (user_id, queue_id) = seed(&pool).await;
        let repo = TicketRepository::new(&pool);

        let ticket = repo
            .create(&new_ticket("Printer broken", queue_id, user_id))
            .await
            .unwrap();

        let changes = TicketChanges {
            title: "Printer on fire".to_string(),
            description: ticket.description.clone(),
            status: TicketStatus::InProgress,
            priority: Priority::High,
            deadline: ticket.deadline,
            queue_id: ticket.queue_id,
            assigned_to: Some(user_id),
        };
        let updated = repo.update(ticket.id, &changes).await.unwrap();
        assert_eq!(updated.title, "Printer on fire");
        assert_eq!(updated.status, TicketStatus::InProgress);
        assert_eq!(updated.assignee_username.as_ref().unwrap().as_str(), "alice");

        repo.delete(ticket.id).await.unwrap();
        assert!(repo.get_by_id(ticket.id).await.unwrap().is_none());
    }
}
