//! Prompt type catalog per configuration scope.

use crate::ai::prompts::DEFAULT_PROMPT_TYPES;
use crate::config::validate_config_id;
use crate::db::prompt_types::{
    get_prompt_type, insert_if_missing, list_prompt_types, overwrite, upsert, PromptType,
};
use crate::db::settings::ensure_configuration;
use crate::db::Database;
use crate::errors::{AppError, AppResult, DatabaseError};
use tracing::{debug, info};

/// Reads and administers the prompt types of each configuration scope.
#[derive(Clone)]
pub struct PromptTypeRegistry {
    db: Database,
}

impl PromptTypeRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Seeds the default prompt types into a scope.
    ///
    /// Safe to call any number of times. Rows that already exist, including
    /// default ids whose text was customized, are left as they are.
    pub fn ensure_defaults(&self, config_id: &str) -> AppResult<()> {
        validate_config_id(config_id)?;

        let conn = self.db.get_conn()?;
        let tx = conn.unchecked_transaction().map_err(DatabaseError::Sqlite)?;
        ensure_configuration(&tx, config_id)?;

        let mut inserted = 0;
        for (position, seed) in DEFAULT_PROMPT_TYPES.iter().enumerate() {
            if insert_if_missing(&tx, &seed_row(config_id, position), position as i64)? {
                inserted += 1;
            } else {
                debug!("Prompt type {} already present in scope {}", seed.id, config_id);
            }
        }
        tx.commit().map_err(DatabaseError::Sqlite)?;

        info!(
            "Default prompt types ensured for scope {} ({} inserted)",
            config_id, inserted
        );
        Ok(())
    }

    /// Restores the seed name and text of every default prompt type in a scope.
    ///
    /// Custom prompt types with other ids are not touched.
    pub fn reset_defaults(&self, config_id: &str) -> AppResult<()> {
        validate_config_id(config_id)?;

        let conn = self.db.get_conn()?;
        let tx = conn.unchecked_transaction().map_err(DatabaseError::Sqlite)?;
        ensure_configuration(&tx, config_id)?;
        for position in 0..DEFAULT_PROMPT_TYPES.len() {
            overwrite(&tx, &seed_row(config_id, position), position as i64)?;
        }
        tx.commit().map_err(DatabaseError::Sqlite)?;

        info!("Default prompt types reset for scope {}", config_id);
        Ok(())
    }

    /// Looks up a prompt type.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the id is unknown in the scope.
    pub fn get(&self, config_id: &str, prompt_type_id: &str) -> AppResult<PromptType> {
        let conn = self.db.get_conn()?;
        get_prompt_type(&conn, config_id, prompt_type_id)?.ok_or_else(|| {
            AppError::NotFound(format!(
                "prompt type '{}' in scope '{}'",
                prompt_type_id, config_id
            ))
        })
    }

    /// Lists a scope's prompt types: seeds first, then custom types in the order they were added.
    pub fn list(&self, config_id: &str) -> AppResult<Vec<PromptType>> {
        let conn = self.db.get_conn()?;
        list_prompt_types(&conn, config_id)
    }

    /// Creates or replaces a prompt type.
    ///
    /// An existing row keeps its position; a new one is listed last.
    pub fn save(&self, prompt_type: &PromptType) -> AppResult<()> {
        validate_config_id(&prompt_type.config_id)?;
        if prompt_type.id.trim().is_empty() {
            return Err(AppError::Validation("Prompt type id cannot be empty".to_string()));
        }
        if prompt_type.name.trim().is_empty() {
            return Err(AppError::Validation("Prompt type name cannot be empty".to_string()));
        }
        if prompt_type.prompt.trim().is_empty() {
            return Err(AppError::Validation("Prompt text cannot be empty".to_string()));
        }

        info!(
            "Saving prompt type {} in scope {}",
            prompt_type.id, prompt_type.config_id
        );
        let conn = self.db.get_conn()?;
        ensure_configuration(&conn, &prompt_type.config_id)?;
        upsert(&conn, prompt_type, DEFAULT_PROMPT_TYPES.len() as i64)
    }
}

fn seed_row(config_id: &str, position: usize) -> PromptType {
    let seed = &DEFAULT_PROMPT_TYPES[position];
    PromptType {
        id: seed.id.to_string(),
        config_id: config_id.to_string(),
        name: seed.name.to_string(),
        prompt: seed.prompt.to_string(),
    }
}
