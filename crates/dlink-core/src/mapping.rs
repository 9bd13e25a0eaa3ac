//! Table and field mapping model

use serde::{Deserialize, Serialize};

use crate::TableField;

/// How rows are written to the target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteMode {
    #[default]
    Insert,
    Upsert,
}

/// How source columns are paired with target columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldMatchPolicy {
    /// Case-insensitive name equality
    #[default]
    ByName,
    /// Ordinal position
    ByPosition,
}

/// Correspondence between one source field and one target field.
///
/// Source-side attributes are empty when no source column matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default)]
    pub source_field_name: Option<String>,
    #[serde(default)]
    pub source_field_type: Option<String>,
    #[serde(default)]
    pub source_primary_key: bool,
    #[serde(default)]
    pub source_nullable: bool,
    pub target_field_name: String,
    #[serde(default)]
    pub target_field_type: String,
    #[serde(default)]
    pub target_primary_key: bool,
    #[serde(default = "default_nullable")]
    pub target_nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldMapping {
    /// A mapping between two columns of the same name and type
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_field_name: Some(source.into()),
            source_nullable: true,
            target_field_name: target.into(),
            target_nullable: true,
            ..Self::default()
        }
    }

    pub fn with_types(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_field_type = Some(source.into());
        self.target_field_type = target.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.source_primary_key = true;
        self.target_primary_key = true;
        self.source_nullable = false;
        self.target_nullable = false;
        self
    }

    /// Source column name, if a source column was matched
    pub fn source_name(&self) -> Option<&str> {
        self.source_field_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    fn pair(source: Option<&TableField>, target: &TableField) -> Self {
        Self {
            source_field_name: source.map(|f| f.name.clone()),
            source_field_type: source.map(|f| f.data_type.clone()),
            source_primary_key: source.is_some_and(|f| f.primary_key),
            source_nullable: source.is_some_and(|f| f.nullable),
            target_field_name: target.name.clone(),
            target_field_type: target.data_type.clone(),
            target_primary_key: target.primary_key,
            target_nullable: target.nullable,
        }
    }
}

/// Mapping from one source table to one target table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMapping {
    pub source_db_name: String,
    pub source_table: String,
    #[serde(default)]
    pub where_clause: Option<String>,
    pub target_db_name: String,
    pub target_table: String,
    #[serde(default)]
    pub write_mode: WriteMode,
    #[serde(default)]
    pub field_match_policy: FieldMatchPolicy,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

impl TableMapping {
    pub fn new(
        source_db: impl Into<String>,
        source_table: impl Into<String>,
        target_db: impl Into<String>,
        target_table: impl Into<String>,
    ) -> Self {
        Self {
            source_db_name: source_db.into(),
            source_table: source_table.into(),
            target_db_name: target_db.into(),
            target_table: target_table.into(),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldMapping>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_filter(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Target-side primary-key fields, in declaration order
    pub fn primary_keys(&self) -> Vec<&FieldMapping> {
        self.fields.iter().filter(|f| f.target_primary_key).collect()
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        self.primary_keys()
            .into_iter()
            .map(|f| f.target_field_name.as_str())
            .collect()
    }

    /// Fields with primary keys first; relative order is otherwise preserved.
    pub fn key_first_fields(&self) -> Vec<&FieldMapping> {
        let mut fields: Vec<&FieldMapping> = self.fields.iter().collect();
        fields.sort_by_key(|f| !f.target_primary_key);
        fields
    }

    /// Upsert only makes sense with at least one key to match on.
    pub fn upsert_enabled(&self) -> bool {
        self.write_mode == WriteMode::Upsert && !self.primary_keys().is_empty()
    }

    /// The filter clause, trimmed, if it is not blank
    pub fn filter(&self) -> Option<&str> {
        self.where_clause
            .as_deref()
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
    }
}

/// Pair every target column with a source column according to `policy`.
///
/// One mapping is produced per target column, in target order.
pub fn match_fields(
    source: &[TableField],
    target: &[TableField],
    policy: FieldMatchPolicy,
) -> Vec<FieldMapping> {
    target
        .iter()
        .enumerate()
        .map(|(position, target_field)| {
            let source_field = match policy {
                FieldMatchPolicy::ByName => source
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(&target_field.name)),
                FieldMatchPolicy::ByPosition => source.get(position),
            };
            FieldMapping::pair(source_field, target_field)
        })
        .collect()
}
