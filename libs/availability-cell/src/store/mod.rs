use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AvailabilityError;
use crate::models::{AvailabilityException, AvailabilityTemplate, DateRange};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAvailabilityStore;
pub use supabase::SupabaseAvailabilityStore;

/// Persistence for weekly templates and closed dates.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn get_template(&self, provider_id: Uuid) -> Result<Option<AvailabilityTemplate>, AvailabilityError>;

    /// Stores `template`, superseding whatever the provider had before.
    async fn put_template(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, AvailabilityError>;

    /// Inserts the exception unless one already exists for that date, in which
    /// case the stored row is returned untouched.
    async fn insert_exception(&self, exception: AvailabilityException) -> Result<AvailabilityException, AvailabilityError>;

    /// Returns `true` when a row was removed.
    async fn delete_exception(&self, provider_id: Uuid, date: NaiveDate) -> Result<bool, AvailabilityError>;

    /// Exceptions within `range`, ordered by date.
    async fn exceptions_in_range(
        &self,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AvailabilityException>, AvailabilityError>;

    async fn is_closed(&self, provider_id: Uuid, date: NaiveDate) -> Result<bool, AvailabilityError> {
        let found = self.exceptions_in_range(provider_id, DateRange::single(date)).await?;
        Ok(!found.is_empty())
    }
}
