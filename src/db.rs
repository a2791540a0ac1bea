use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;

use crate::error::ConfiguratorError;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

#[derive(Debug, Clone, Serialize)]
pub struct Configuration {
    pub id: i64,
    pub name: String,
    pub semantic_schema: String,
    pub data_schema: String,
    pub ui_schema: String,
    pub js_function_impl: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing view: the derived schema bodies are omitted to keep the
/// configuration index light.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationSummary {
    pub id: i64,
    pub name: String,
    pub semantic_schema: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: i64,
    pub configuration_id: i64,
    pub rule_text: String,
    pub rule_order: i64,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub configuration_id: i64,
    pub action: String,
    pub details: String,
    pub created_at: String,
}

/// Partial update for a configuration. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationUpdate {
    pub name: Option<String>,
    pub semantic_schema: Option<String>,
    pub data_schema: Option<String>,
    pub ui_schema: Option<String>,
    pub js_function_impl: Option<String>,
}

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, ConfiguratorError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = r2d2::Pool::new(manager)?;
        let db = Self { pool };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), ConfiguratorError> {
        let conn = self.pool.get()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS configurations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                semantic_schema TEXT NOT NULL,
                data_schema TEXT,
                ui_schema TEXT,
                js_function_impl TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entity_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                configuration_id INTEGER NOT NULL,
                rule_text TEXT NOT NULL,
                rule_order INTEGER DEFAULT 0,
                is_active BOOLEAN DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (configuration_id) REFERENCES configurations (id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS activity_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                configuration_id INTEGER,
                action TEXT NOT NULL,
                details TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (configuration_id) REFERENCES configurations (id) ON DELETE CASCADE
            )",
            [],
        )?;

        log::info!("Database tables created/verified");
        Ok(())
    }

    // --- Configurations ---

    pub fn create_configuration(
        &self,
        name: &str,
        semantic_schema: &str,
        data_schema: &str,
        ui_schema: &str,
        js_function_impl: &str,
    ) -> Result<i64, ConfiguratorError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO configurations (name, semantic_schema, data_schema, ui_schema, js_function_impl)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, semantic_schema, data_schema, ui_schema, js_function_impl],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.log_activity(id, "CREATE", &format!("Configuration \"{name}\" created"))?;
        Ok(id)
    }

    pub fn get_configuration(&self, id: i64) -> Result<Option<Configuration>, ConfiguratorError> {
        let conn = self.pool.get()?;
        let config = conn
            .query_row(
                "SELECT id, name, semantic_schema, data_schema, ui_schema, js_function_impl,
                        created_at, updated_at
                 FROM configurations WHERE id = ?1",
                params![id],
                configuration_from_row,
            )
            .optional()?;
        Ok(config)
    }

    pub fn list_configurations(&self) -> Result<Vec<ConfigurationSummary>, ConfiguratorError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, semantic_schema, created_at, updated_at
             FROM configurations ORDER BY updated_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ConfigurationSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    semantic_schema: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_configuration(
        &self,
        id: i64,
        update: &ConfigurationUpdate,
    ) -> Result<usize, ConfiguratorError> {
        let mut assignments = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
        let mut changed_fields = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(name);
            changed_fields.push("name");
        }
        if let Some(semantic_schema) = &update.semantic_schema {
            assignments.push("semantic_schema = ?");
            values.push(semantic_schema);
            changed_fields.push("semantic_schema");
        }
        if let Some(data_schema) = &update.data_schema {
            assignments.push("data_schema = ?");
            values.push(data_schema);
            changed_fields.push("data_schema");
        }
        if let Some(ui_schema) = &update.ui_schema {
            assignments.push("ui_schema = ?");
            values.push(ui_schema);
            changed_fields.push("ui_schema");
        }
        if let Some(js_function_impl) = &update.js_function_impl {
            assignments.push("js_function_impl = ?");
            values.push(js_function_impl);
            changed_fields.push("js_function_impl");
        }

        assignments.push("updated_at = CURRENT_TIMESTAMP");
        values.push(&id);

        let sql = format!(
            "UPDATE configurations SET {} WHERE id = ?",
            assignments.join(", ")
        );

        let conn = self.pool.get()?;
        let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
        drop(conn);

        self.log_activity(
            id,
            "UPDATE",
            &format!("Configuration updated: {}", changed_fields.join(", ")),
        )?;
        Ok(changed)
    }

    pub fn delete_configuration(&self, id: i64) -> Result<bool, ConfiguratorError> {
        let Some(config) = self.get_configuration(id)? else {
            return Ok(false);
        };

        let conn = self.pool.get()?;
        conn.execute("DELETE FROM configurations WHERE id = ?1", params![id])?;
        drop(conn);

        self.log_activity(
            id,
            "DELETE",
            &format!("Configuration \"{}\" deleted", config.name),
        )?;
        Ok(true)
    }

    // --- Rules ---

    pub fn create_rule(
        &self,
        configuration_id: i64,
        rule_text: &str,
        rule_order: i64,
    ) -> Result<i64, ConfiguratorError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO entity_rules (configuration_id, rule_text, rule_order) VALUES (?1, ?2, ?3)",
            params![configuration_id, rule_text, rule_order],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.log_activity(
            configuration_id,
            "RULE_ADD",
            &format!("Rule added: \"{rule_text}\""),
        )?;
        Ok(id)
    }

    /// Active rules for a configuration, in their authored order.
    pub fn rules_for_configuration(
        &self,
        configuration_id: i64,
    ) -> Result<Vec<Rule>, ConfiguratorError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, configuration_id, rule_text, rule_order, is_active, created_at
             FROM entity_rules
             WHERE configuration_id = ?1 AND is_active = 1
             ORDER BY rule_order, created_at",
        )?;
        let rows = stmt
            .query_map(params![configuration_id], rule_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_rule(
        &self,
        id: i64,
        rule_text: &str,
        rule_order: i64,
    ) -> Result<usize, ConfiguratorError> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE entity_rules SET rule_text = ?1, rule_order = ?2 WHERE id = ?3",
            params![rule_text, rule_order, id],
        )?;
        Ok(changed)
    }

    pub fn delete_rule(&self, id: i64) -> Result<usize, ConfiguratorError> {
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM entity_rules WHERE id = ?1", params![id])?;
        Ok(changed)
    }

    // --- Activity log ---

    pub fn log_activity(
        &self,
        configuration_id: i64,
        action: &str,
        details: &str,
    ) -> Result<(), ConfiguratorError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO activity_log (configuration_id, action, details) VALUES (?1, ?2, ?3)",
            params![configuration_id, action, details],
        )?;
        Ok(())
    }

    pub fn activity_log(
        &self,
        configuration_id: i64,
        limit: i64,
    ) -> Result<Vec<ActivityEntry>, ConfiguratorError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, configuration_id, action, details, created_at
             FROM activity_log
             WHERE configuration_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![configuration_id, limit], |row| {
                Ok(ActivityEntry {
                    id: row.get(0)?,
                    configuration_id: row.get(1)?,
                    action: row.get(2)?,
                    details: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    created_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn configuration_from_row(row: &Row) -> rusqlite::Result<Configuration> {
    Ok(Configuration {
        id: row.get(0)?,
        name: row.get(1)?,
        semantic_schema: row.get(2)?,
        data_schema: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        ui_schema: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        js_function_impl: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn rule_from_row(row: &Row) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        configuration_id: row.get(1)?,
        rule_text: row.get(2)?,
        rule_order: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        // A single-connection pool: every pooled connection would otherwise
        // get its own private in-memory database.
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let db = Database { pool };
        db.init().unwrap();
        db
    }

    #[test]
    fn create_and_fetch_a_configuration() {
        let db = test_db();
        let id = db
            .create_configuration("invoice", "An invoice form", "{}", "{}", "")
            .unwrap();

        let config = db.get_configuration(id).unwrap().unwrap();
        assert_eq!(config.name, "invoice");
        assert_eq!(config.semantic_schema, "An invoice form");
        assert_eq!(config.data_schema, "{}");
        assert!(!config.created_at.is_empty());
    }

    #[test]
    fn missing_configuration_is_none() {
        let db = test_db();
        assert!(db.get_configuration(42).unwrap().is_none());
    }

    #[test]
    fn configuration_names_are_unique() {
        let db = test_db();
        db.create_configuration("invoice", "v1", "", "", "").unwrap();

        let err = db
            .create_configuration("invoice", "v2", "", "", "")
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[test]
    fn listing_returns_summaries_for_all_configurations() {
        let db = test_db();
        db.create_configuration("alpha", "first", "", "", "").unwrap();
        db.create_configuration("beta", "second", "", "", "").unwrap();

        let list = db.list_configurations().unwrap();
        assert_eq!(list.len(), 2);
        let names: Vec<_> = list.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"alpha"));
        assert!(names.contains(&"beta"));
    }

    #[test]
    fn update_touches_only_the_given_fields() {
        let db = test_db();
        let id = db
            .create_configuration("invoice", "v1", "{\"old\":true}", "", "")
            .unwrap();

        let changed = db
            .update_configuration(
                id,
                &ConfigurationUpdate {
                    data_schema: Some("{\"new\":true}".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(changed, 1);

        let config = db.get_configuration(id).unwrap().unwrap();
        assert_eq!(config.data_schema, "{\"new\":true}");
        assert_eq!(config.name, "invoice");
        assert_eq!(config.semantic_schema, "v1");
    }

    #[test]
    fn delete_reports_whether_anything_existed() {
        let db = test_db();
        let id = db.create_configuration("invoice", "v1", "", "", "").unwrap();

        assert!(db.delete_configuration(id).unwrap());
        assert!(db.get_configuration(id).unwrap().is_none());
        assert!(!db.delete_configuration(id).unwrap());
    }

    #[test]
    fn rules_come_back_in_authored_order() {
        let db = test_db();
        let config_id = db.create_configuration("form", "a form", "", "", "").unwrap();

        db.create_rule(config_id, "second", 2).unwrap();
        db.create_rule(config_id, "first", 1).unwrap();
        db.create_rule(config_id, "third", 3).unwrap();

        let rules = db.rules_for_configuration(config_id).unwrap();
        let texts: Vec<_> = rules.iter().map(|r| r.rule_text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn deleted_rules_disappear_from_the_listing() {
        let db = test_db();
        let config_id = db.create_configuration("form", "a form", "", "", "").unwrap();
        let rule_id = db.create_rule(config_id, "only rule", 0).unwrap();

        assert_eq!(db.delete_rule(rule_id).unwrap(), 1);
        assert!(db.rules_for_configuration(config_id).unwrap().is_empty());
    }

    #[test]
    fn update_rule_rewrites_text_and_order() {
        let db = test_db();
        let config_id = db.create_configuration("form", "a form", "", "", "").unwrap();
        let rule_id = db.create_rule(config_id, "draft", 5).unwrap();

        assert_eq!(db.update_rule(rule_id, "final", 1).unwrap(), 1);

        let rules = db.rules_for_configuration(config_id).unwrap();
        assert_eq!(rules[0].rule_text, "final");
        assert_eq!(rules[0].rule_order, 1);
    }

    #[test]
    fn mutations_append_to_the_activity_log() {
        let db = test_db();
        let id = db.create_configuration("form", "a form", "", "", "").unwrap();
        db.create_rule(id, "be strict", 0).unwrap();
        db.update_configuration(
            id,
            &ConfigurationUpdate {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let log = db.activity_log(id, 50).unwrap();
        let actions: Vec<_> = log.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(log.len(), 3);
        assert!(actions.contains(&"CREATE"));
        assert!(actions.contains(&"RULE_ADD"));
        assert!(actions.contains(&"UPDATE"));
    }

    #[test]
    fn activity_log_respects_the_limit() {
        let db = test_db();
        let id = db.create_configuration("form", "a form", "", "", "").unwrap();
        for n in 0..5 {
            db.create_rule(id, &format!("rule {n}"), n).unwrap();
        }

        // CREATE + 5 RULE_ADD entries exist; ask for fewer.
        assert_eq!(db.activity_log(id, 3).unwrap().len(), 3);
    }
}
