use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AvailabilityStore;
use crate::error::AvailabilityError;
use crate::models::{AvailabilityException, AvailabilityTemplate, DateRange};

#[derive(Debug, Default)]
pub struct InMemoryAvailabilityStore {
    templates: RwLock<HashMap<Uuid, AvailabilityTemplate>>,
    exceptions: RwLock<HashMap<Uuid, BTreeMap<NaiveDate, AvailabilityException>>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn get_template(&self, provider_id: Uuid) -> Result<Option<AvailabilityTemplate>, AvailabilityError> {
        Ok(self.templates.read().await.get(&provider_id).cloned())
    }

    async fn put_template(&self, template: AvailabilityTemplate) -> Result<AvailabilityTemplate, AvailabilityError> {
        self.templates
            .write()
            .await
            .insert(template.provider_id, template.clone());
        Ok(template)
    }

    async fn insert_exception(&self, exception: AvailabilityException) -> Result<AvailabilityException, AvailabilityError> {
        let mut exceptions = self.exceptions.write().await;
        let stored = exceptions
            .entry(exception.provider_id)
            .or_default()
            .entry(exception.date)
            .or_insert(exception);
        Ok(stored.clone())
    }

    async fn delete_exception(&self, provider_id: Uuid, date: NaiveDate) -> Result<bool, AvailabilityError> {
        let mut exceptions = self.exceptions.write().await;
        Ok(exceptions
            .get_mut(&provider_id)
            .map(|dates| dates.remove(&date).is_some())
            .unwrap_or(false))
    }

    async fn exceptions_in_range(
        &self,
        provider_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<AvailabilityException>, AvailabilityError> {
        let exceptions = self.exceptions.read().await;
        Ok(exceptions
            .get(&provider_id)
            .map(|dates| dates.range(range.from..=range.to).map(|(_, e)| e.clone()).collect())
            .unwrap_or_default())
    }
}
