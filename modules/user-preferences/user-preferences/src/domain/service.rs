use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};
use user_preferences_sdk::{
    FieldViolation, PreferenceEntry, PreferenceKey, PreferenceValue, UserId,
};

use super::error::DomainError;
use super::registry::{PreferenceRegistry, PreferenceSpec, RegistryError};
use super::repo::{PreferenceRepository, PreferenceWrite, StoredPreference};

// ============================================================================
// Service Configuration
// ============================================================================

pub struct ServiceConfig {
    pub max_batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { max_batch_size: 32 }
    }
}

// ============================================================================
// Service Implementation
// ============================================================================

/// Per-user preference store: default/override resolution on read,
/// validation and default compaction on write.
pub struct Service {
    repo: Arc<dyn PreferenceRepository>,
    registry: &'static PreferenceRegistry,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(repo: Arc<dyn PreferenceRepository>, config: ServiceConfig) -> Self {
        Self::with_registry(repo, PreferenceRegistry::global(), config)
    }

    #[must_use]
    pub fn with_registry(
        repo: Arc<dyn PreferenceRepository>,
        registry: &'static PreferenceRegistry,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            registry,
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'static PreferenceRegistry {
        self.registry
    }

    /// # Errors
    /// Storage failures, or `Registry` when `key` has no table entry.
    pub async fn get(
        &self,
        user: UserId,
        key: PreferenceKey,
    ) -> Result<PreferenceValue, DomainError> {
        let stored = self.repo.find(user, key).await?;
        self.resolve(user, key, stored.as_ref())
    }

    /// Every registered key exactly once, in declaration order.
    ///
    /// # Errors
    /// Storage failures.
    pub async fn get_all(&self, user: UserId) -> Result<Vec<PreferenceEntry>, DomainError> {
        let mut rows: HashMap<String, StoredPreference> = self
            .repo
            .list_for_user(user)
            .await?
            .into_iter()
            .map(|row| (row.key.clone(), row))
            .collect();

        let entries = PreferenceKey::ALL
            .into_iter()
            .map(|key| {
                let row = rows.remove(key.as_str());
                self.resolve(user, key, row.as_ref())
                    .map(|value| PreferenceEntry::new(key, value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !rows.is_empty() {
            debug!(
                user = %user,
                ignored = rows.len(),
                "Ignoring stored rows for unregistered preference keys"
            );
        }

        Ok(entries)
    }

    /// # Errors
    /// `Validation` when `value` is outside the key's domain; nothing is
    /// written in that case.
    pub async fn set(
        &self,
        user: UserId,
        key: PreferenceKey,
        value: PreferenceValue,
    ) -> Result<(), DomainError> {
        let write = self.plan_write(key, &value)?;
        self.repo.apply(user, vec![write]).await?;

        debug!(user = %user, key = %key, value = %value, "Preference stored");
        Ok(())
    }

    /// Validates every entry before touching storage; the whole batch is
    /// written in one transaction.
    ///
    /// # Errors
    /// `Validation` listing every offending entry, or storage failures.
    pub async fn set_many(
        &self,
        user: UserId,
        entries: &[PreferenceEntry],
    ) -> Result<(), DomainError> {
        if entries.len() > self.config.max_batch_size {
            return Err(DomainError::validation(
                "preferences",
                format!(
                    "at most {} preferences can be changed at once",
                    self.config.max_batch_size
                ),
            ));
        }

        let mut seen = HashSet::new();
        let mut writes = Vec::with_capacity(entries.len());
        let mut violations = Vec::new();

        for entry in entries {
            if !seen.insert(entry.key) {
                violations.push(FieldViolation::new(
                    entry.key.as_str(),
                    "specified more than once",
                ));
                continue;
            }
            match self.plan_write(entry.key, &entry.value) {
                Ok(write) => writes.push(write),
                Err(RegistryError::Invalid { field, message }) => {
                    violations.push(FieldViolation { field, message });
                }
                Err(other) => return Err(other.into()),
            }
        }

        if !violations.is_empty() {
            return Err(DomainError::Validation { violations });
        }
        if writes.is_empty() {
            return Ok(());
        }

        let count = writes.len();
        self.repo.apply(user, writes).await?;

        debug!(user = %user, count, "Preference batch stored");
        Ok(())
    }

    /// # Errors
    /// Storage failures.
    pub async fn reset(&self, user: UserId, key: PreferenceKey) -> Result<(), DomainError> {
        let default = self.registry.default_of(key)?;
        self.set(user, key, default).await
    }

    /// Registry entries in declaration order.
    ///
    /// # Errors
    /// `Registry` when the table misses a declared key.
    pub fn describe(&self) -> Result<Vec<&'static PreferenceSpec>, DomainError> {
        PreferenceKey::ALL
            .into_iter()
            .map(|key| self.registry.spec(key).map_err(DomainError::from))
            .collect()
    }

    /// Default when no row exists; decoded row otherwise. Rows the registry
    /// cannot interpret fall back to the default.
    fn resolve(
        &self,
        user: UserId,
        key: PreferenceKey,
        row: Option<&StoredPreference>,
    ) -> Result<PreferenceValue, DomainError> {
        let default = self.registry.default_of(key)?;
        let Some(row) = row else {
            return Ok(default);
        };

        match self.registry.decode(key, row.raw.as_deref()) {
            Ok(value) => Ok(value),
            Err(e) if e.is_corrupt_data() => {
                warn!(
                    user = %user,
                    key = %key,
                    error = %e,
                    "Corrupt stored preference, falling back to default"
                );
                Ok(default)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Values equal to the default are never stored.
    fn plan_write(
        &self,
        key: PreferenceKey,
        value: &PreferenceValue,
    ) -> Result<PreferenceWrite, RegistryError> {
        self.registry.validate(key, value)?;

        if *value == self.registry.default_of(key)? {
            return Ok(PreferenceWrite::Delete { key });
        }

        let raw = self.registry.encode(key, value)?;
        Ok(PreferenceWrite::Upsert { key, raw })
    }
}
