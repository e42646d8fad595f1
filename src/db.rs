//! Provider repository for the relational store.
//!
//! Connection-shaped stub: the target backend (Oracle) is an external
//! collaborator this snapshot never reaches, so every data operation returns
//! [`DatabaseError::NotImplemented`]. `disconnect` is deliberately tolerant —
//! it runs during cleanup and must never mask the failure that got us there.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DbSettings;
use crate::xml::ProviderRecord;

/// Errors raised by repository operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The operation has no implementation yet.
    #[error("database {operation} not yet implemented")]
    NotImplemented {
        /// The operation that was requested.
        operation: &'static str,
    },
}

/// Aggregate row counts for the provider schema.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Rows in the providers table.
    pub total_providers: u64,
    /// Rows in the locations table.
    pub total_locations: u64,
    /// Rows in the specialties table.
    pub total_specialties: u64,
    /// Timestamp of the most recent load, if any.
    pub last_update: Option<String>,
}

/// Repository persisting provider records.
#[derive(Debug)]
pub struct ProviderRepository {
    settings: DbSettings,
}

impl ProviderRepository {
    /// Creates a disconnected repository from resolved settings.
    #[must_use]
    pub fn new(settings: DbSettings) -> Self {
        info!(
            url = %settings.url,
            driver = %settings.driver,
            "Provider repository initialized (stub implementation)"
        );
        Self { settings }
    }

    /// Opens the database connection.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn connect(&mut self) -> Result<(), DatabaseError> {
        warn!("database connection not yet implemented - stub method called");
        info!(url = %self.settings.url, "would connect to database");
        Err(DatabaseError::NotImplemented {
            operation: "connection",
        })
    }

    /// Closes the database connection. Tolerant: cleanup calls this
    /// unconditionally.
    pub fn disconnect(&mut self) {
        debug!("database disconnect requested (stub implementation)");
    }

    /// Persists one provider record.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn save_provider(&mut self, record: &ProviderRecord) -> Result<(), DatabaseError> {
        warn!("provider save not yet implemented - stub method called");
        info!(provider_id = %record.provider_id, "would save provider");
        Err(DatabaseError::NotImplemented {
            operation: "provider save",
        })
    }

    /// Persists a batch of provider records.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn save_providers(&mut self, records: &[ProviderRecord]) -> Result<(), DatabaseError> {
        warn!("batch provider save not yet implemented - stub method called");
        info!(count = records.len(), "would save providers");
        Err(DatabaseError::NotImplemented {
            operation: "batch provider save",
        })
    }

    /// Checks whether a provider identifier already exists.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn provider_exists(&mut self, provider_id: &str) -> Result<bool, DatabaseError> {
        warn!("provider existence check not yet implemented - stub method called");
        info!(provider_id, "would check provider existence");
        Err(DatabaseError::NotImplemented {
            operation: "provider existence check",
        })
    }

    /// Updates an existing provider record.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn update_provider(&mut self, record: &ProviderRecord) -> Result<(), DatabaseError> {
        warn!("provider update not yet implemented - stub method called");
        info!(provider_id = %record.provider_id, "would update provider");
        Err(DatabaseError::NotImplemented {
            operation: "provider update",
        })
    }

    /// Deletes a provider, cascading to locations and specialties.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn delete_provider(&mut self, provider_id: &str) -> Result<(), DatabaseError> {
        warn!("provider deletion not yet implemented - stub method called");
        info!(provider_id, "would delete provider");
        Err(DatabaseError::NotImplemented {
            operation: "provider deletion",
        })
    }

    /// Reports aggregate statistics for the provider schema.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::NotImplemented`].
    pub fn stats(&mut self) -> Result<DatabaseStats, DatabaseError> {
        warn!("database stats not yet implemented - stub method called");
        Err(DatabaseError::NotImplemented { operation: "stats" })
    }

    /// Reports connection health. Always false until a real backend lands.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        debug!("checking database health (stub implementation)");
        false
    }
}
