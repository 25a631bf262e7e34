//! SQLite-backed lookup source.

use crate::LookupError;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Table names that mark a definition table.
pub const PREFERRED_TABLES: [&str; 5] = ["apis", "api_definitions", "endpoints", "api_catalog", "netvisor_apis"];

/// Maximum rows read from the definition table.
pub const ROW_LIMIT: usize = 100;

/// One definition row, with every mapped column rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupDefinition {
    pub id: String,
    pub service: String,
    pub method: String,
    pub path: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub parameters: String,
    pub example: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Service,
    Method,
    Path,
    Description,
    Category,
    Tags,
    Parameters,
    Example,
}

/// Column name to field. Matching ignores ASCII case.
const COLUMN_MAP: &[(&str, Field)] = &[
    ("id", Field::Id),
    ("service", Field::Service),
    ("method", Field::Method),
    ("path", Field::Path),
    ("description", Field::Description),
    ("category", Field::Category),
    ("tags", Field::Tags),
    ("parameters", Field::Parameters),
    ("example", Field::Example),
];

fn field_for(column: &str) -> Option<Field> {
    COLUMN_MAP
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(column))
        .map(|(_, field)| *field)
}

impl LookupDefinition {
    fn assign(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Service => &mut self.service,
            Field::Method => &mut self.method,
            Field::Path => &mut self.path,
            Field::Description => &mut self.description,
            Field::Category => &mut self.category,
            Field::Tags => &mut self.tags,
            Field::Parameters => &mut self.parameters,
            Field::Example => &mut self.example,
        };
        *slot = value;
    }

    fn matches(&self, keyword: &str) -> bool {
        [&self.description, &self.path, &self.category, &self.tags]
            .iter()
            .any(|text| text.to_lowercase().contains(keyword))
    }
}

fn render(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read-only handle on the lookup database.
pub struct LookupSource {
    connection: Mutex<Connection>,
    path: PathBuf,
}

impl LookupSource {
    /// Open the database read-only and check that it is readable.
    pub fn open(path: &Path) -> Result<Self, LookupError> {
        let unavailable = |e: rusqlite::Error| LookupError::Unavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unavailable)?;
        connection
            .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(unavailable)?;

        tracing::debug!(path = %path.display(), "Opened lookup database");
        Ok(Self {
            connection: Mutex::new(connection),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, LookupError> {
        self.connection.lock().map_err(|_| LookupError::Poisoned)
    }

    /// User tables, sorted by name.
    pub fn tables(&self) -> Result<Vec<String>, LookupError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    /// Columns of `table` as `"<name> <type>"`.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>, LookupError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(format!("{} {}", row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Table holding the definitions: in name order, the first table whose
    /// name is in [`PREFERRED_TABLES`], otherwise the first table.
    fn definition_table(&self) -> Result<String, LookupError> {
        let tables = self.tables()?;
        match tables.iter().position(|t| PREFERRED_TABLES.contains(&t.as_str())) {
            Some(index) => Ok(tables[index].clone()),
            None => tables.into_iter().next().ok_or(LookupError::NoTables),
        }
    }

    /// Up to [`ROW_LIMIT`] definitions. Rows without an id get `lookup_<n>`.
    pub fn definitions(&self) -> Result<Vec<LookupDefinition>, LookupError> {
        let table = self.definition_table()?;
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} LIMIT {}",
            quote_identifier(&table),
            ROW_LIMIT
        ))?;
        let fields: Vec<Option<Field>> = stmt.column_names().into_iter().map(field_for).collect();

        let mut definitions = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut definition = LookupDefinition::default();
            for (index, field) in fields.iter().enumerate() {
                let Some(field) = field else { continue };
                if let Some(value) = render(row.get_ref(index)?) {
                    definition.assign(*field, value);
                }
            }
            if definition.id.is_empty() {
                definition.id = format!("lookup_{}", definitions.len() + 1);
            }
            definitions.push(definition);
        }

        tracing::debug!(table = %table, rows = definitions.len(), "Read lookup definitions");
        Ok(definitions)
    }

    /// Definitions of one service; an empty service returns all.
    pub fn definitions_by_service(&self, service: &str) -> Result<Vec<LookupDefinition>, LookupError> {
        Ok(self
            .definitions()?
            .into_iter()
            .filter(|definition| service.is_empty() || definition.service == service)
            .collect())
    }

    /// Case-insensitive keyword search over description, path, category and tags.
    pub fn search(&self, keyword: &str) -> Result<Vec<LookupDefinition>, LookupError> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .definitions()?
            .into_iter()
            .filter(|definition| definition.matches(&keyword))
            .collect())
    }
}

impl std::fmt::Debug for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupSource")
            .field("path", &self.path)
            .finish()
    }
}
