//! Storage seam shared by every service in the crate.
//!
//! Services hold `Arc<dyn Repository<R>>` and never see the backing table,
//! so the pricing and bridge logic runs unchanged against the in-memory
//! tables in `tidyquote-db` or against test fakes.

use std::fmt::{Debug, Display};

use thiserror::Error;

pub trait RecordId: Copy + Eq + Debug + Display + Send + Sync + 'static {
    fn from_raw(raw: u64) -> Self;
    fn raw(self) -> u64;
}

pub trait Record: Clone + Send + Sync + 'static {
    type Id: RecordId;

    fn id(&self) -> Self::Id;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record `{id}` already exists in `{table}`")]
    Duplicate { table: &'static str, id: String },
    #[error("store `{table}` is unavailable: {reason}")]
    Unavailable { table: &'static str, reason: String },
}

/// Table-shaped storage. Implementations keep insertion order for `all`.
pub trait Repository<R: Record>: Send + Sync {
    fn all(&self) -> Result<Vec<R>, StoreError>;
    fn find(&self, id: R::Id) -> Result<Option<R>, StoreError>;
    /// Allocates the next id. Ids are never reused, even after `remove`.
    fn next_id(&self) -> Result<R::Id, StoreError>;
    fn insert(&self, record: R) -> Result<(), StoreError>;
    /// Runs `change` on the current row while holding the table's write
    /// lock and returns the row as stored afterwards. `None` when no record
    /// with the id exists.
    fn modify(&self, id: R::Id, change: &mut dyn FnMut(&mut R)) -> Result<Option<R>, StoreError>;
    /// Returns the removed record, `None` when no record with the id exists.
    fn remove(&self, id: R::Id) -> Result<Option<R>, StoreError>;
}
