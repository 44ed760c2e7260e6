use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tidyquote_core::store::{Record, RecordId, Repository, StoreError};
use tracing::warn;

/// Vec-backed table guarded by a single writer lock. Rows keep insertion
/// order and ids come from a counter that only moves forward.
pub struct InMemoryRepository<R: Record> {
    table: &'static str,
    rows: RwLock<Vec<R>>,
    last_id: AtomicU64,
}

impl<R: Record> InMemoryRepository<R> {
    pub fn new(table: &'static str) -> Self {
        Self::with_rows(table, Vec::new())
    }

    /// Preloads rows; the id counter starts past the largest preloaded id.
    pub fn with_rows(table: &'static str, rows: Vec<R>) -> Self {
        let last_id = rows.iter().map(|row| row.id().raw()).max().unwrap_or(0);
        Self { table, rows: RwLock::new(rows), last_id: AtomicU64::new(last_id) }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<R>> {
        self.rows.read().unwrap_or_else(|poisoned| {
            warn!(event_name = "store.lock_poisoned", table = self.table, "recovering read lock");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<R>> {
        self.rows.write().unwrap_or_else(|poisoned| {
            warn!(event_name = "store.lock_poisoned", table = self.table, "recovering write lock");
            poisoned.into_inner()
        })
    }
}

impl<R: Record> Repository<R> for InMemoryRepository<R> {
    fn all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.read().clone())
    }

    fn find(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        Ok(self.read().iter().find(|row| row.id() == id).cloned())
    }

    fn next_id(&self) -> Result<R::Id, StoreError> {
        let raw = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(R::Id::from_raw(raw))
    }

    fn insert(&self, record: R) -> Result<(), StoreError> {
        let mut rows = self.write();
        let id = record.id();
        if rows.iter().any(|row| row.id() == id) {
            return Err(StoreError::Duplicate { table: self.table, id: id.to_string() });
        }
        // Records built with externally chosen ids must not be handed out again.
        self.last_id.fetch_max(id.raw(), Ordering::SeqCst);
        rows.push(record);
        Ok(())
    }

    fn modify(&self, id: R::Id, change: &mut dyn FnMut(&mut R)) -> Result<Option<R>, StoreError> {
        let mut rows = self.write();
        Ok(rows.iter_mut().find(|row| row.id() == id).map(|row| {
            change(row);
            row.clone()
        }))
    }

    fn remove(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        let mut rows = self.write();
        Ok(rows.iter().position(|row| row.id() == id).map(|index| rows.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;

    use tidyquote_core::domain::client::{Client, ClientId, ClientStatus};
    use tidyquote_core::store::{Repository, StoreError};

    use super::InMemoryRepository;

    fn client(id: u64, name: &str) -> Client {
        Client {
            id: ClientId(id),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: String::new(),
            status: ClientStatus::Client,
            source: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let repo = InMemoryRepository::new("clients");
        for (id, name) in [(3, "Cleo"), (1, "Ana"), (2, "Bo")] {
            repo.insert(client(id, name)).expect("insert");
        }

        let names = repo.all().expect("all").into_iter().map(|c| c.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Cleo", "Ana", "Bo"]);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let repo = InMemoryRepository::with_rows("clients", vec![client(4, "Ana")]);

        let next = repo.next_id().expect("id");
        assert_eq!(next, ClientId(5));
        repo.insert(client(next.0, "Bo")).expect("insert");
        assert!(repo.remove(next).expect("remove").is_some());

        assert_eq!(repo.next_id().expect("id"), ClientId(6));
    }

    #[test]
    fn insert_with_external_id_moves_the_counter() {
        let repo = InMemoryRepository::new("clients");
        repo.insert(client(10, "Ana")).expect("insert");

        assert_eq!(repo.next_id().expect("id"), ClientId(11));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let repo = InMemoryRepository::new("clients");
        repo.insert(client(1, "Ana")).expect("insert");

        assert_eq!(
            repo.insert(client(1, "Bo")),
            Err(StoreError::Duplicate { table: "clients", id: "1".to_string() })
        );
    }

    #[test]
    fn modify_and_remove_report_missing_rows() {
        let repo = InMemoryRepository::new("clients");
        let mut calls = 0;
        assert_eq!(repo.modify(ClientId(1), &mut |_| calls += 1).expect("modify"), None);
        assert_eq!(calls, 0);
        assert_eq!(repo.remove(ClientId(1)).expect("remove"), None);

        repo.insert(client(1, "Ana")).expect("insert");
        let renamed = repo
            .modify(ClientId(1), &mut |row| row.name = "Anna".to_string())
            .expect("modify")
            .map(|c| c.name);
        assert_eq!(renamed, Some("Anna".to_string()));
        assert_eq!(repo.find(ClientId(1)).expect("find").map(|c| c.name), Some("Anna".to_string()));
        assert_eq!(repo.remove(ClientId(1)).expect("remove").map(|c| c.name), Some("Anna".to_string()));
        assert!(repo.is_empty());
    }

    #[test]
    fn concurrent_modifications_are_not_lost() {
        let repo = Arc::new(InMemoryRepository::with_rows("clients", vec![client(1, "Ana")]));

        let workers = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    for _ in 0..50 {
                        repo.modify(ClientId(1), &mut |row| row.phone.push('1')).expect("modify");
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().expect("worker");
        }

        let phone = repo.find(ClientId(1)).expect("find").map(|c| c.phone).unwrap_or_default();
        assert_eq!(phone.len(), 400);
    }
}
