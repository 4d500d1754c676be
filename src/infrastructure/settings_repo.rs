use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::SettingsStore;
use crate::schema::settings;

use super::models::SettingRow;

/// Reads the `settings` table on every lookup; nothing is cached.
pub struct DieselSettingsStore {
    pool: DbPool,
}

impl DieselSettingsStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl SettingsStore for DieselSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = settings::table
            .filter(settings::key.eq(key))
            .select(SettingRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(|setting| setting.value))
    }
}
