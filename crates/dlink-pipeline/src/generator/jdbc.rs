//! JDBC-family stages

use dlink_core::{DriverDescriptor, Result, SqlDialect, TableMapping};
use serde_json::Value;

use super::{StageGenerator, qualified_table};
use crate::context::GenerationContext;
use crate::stage::Stage;

const PLUGIN: &str = "Jdbc";

#[derive(Debug, Clone, Copy, Default)]
pub struct JdbcGenerator;

impl StageGenerator for JdbcGenerator {
    fn name(&self) -> &'static str {
        "jdbc"
    }

    fn supports(&self, descriptor: &DriverDescriptor) -> bool {
        descriptor.family_starts_with("JDBC")
    }

    fn generate_source(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let source = ctx.source();
        let props = source.properties();
        let dialect = SqlDialect::for_descriptor(source.descriptor);
        let config = ctx.config();
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let output = ctx.allocate_source_name(&mapping.source_table)?;
            let mut stage = Stage::new(PLUGIN);
            stage.extend_props(&props);
            stage
                .set("connection_check_timeout_sec", config.connection_check_timeout_sec)
                .set("parallelism", config.parallelism)
                .set(&keys.output, output)
                .set("query", select_query(mapping, dialect));
            stages.push(stage);
        }
        Ok(stages)
    }

    fn generate_sink(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let props = ctx.target().properties();
        let config = ctx.config();
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let input = ctx.take_input(&mapping.source_table)?;
            let upsert = mapping.upsert_enabled();
            let mut stage = Stage::new(PLUGIN);
            stage.extend_props(&props);
            stage
                .set(&keys.input, input)
                .set("connection_check_timeout_sec", config.connection_check_timeout_sec)
                .set("batch_size", config.batch_size)
                .set("max_commit_attempts", config.max_commit_attempts)
                .set("max_retries", config.max_retries)
                .set("database", mapping.target_db_name.as_str())
                .set("table", mapping.target_table.as_str())
                .set("generate_sink_sql", true)
                .set("enable_upsert", upsert);
            if upsert {
                let primary_keys: Vec<Value> = mapping
                    .primary_key_names()
                    .into_iter()
                    .map(Value::from)
                    .collect();
                stage.set("primary_keys", primary_keys);
            }
            stages.push(stage);
        }
        Ok(stages)
    }
}

/// The read query for one table mapping.
///
/// Mapped fields are listed primary keys first and aliased when the target
/// name differs. Without any mapped source field the query selects `*`.
pub fn select_query(mapping: &TableMapping, dialect: SqlDialect) -> String {
    let columns: Vec<String> = mapping
        .key_first_fields()
        .into_iter()
        .filter_map(|field| {
            let source = field.source_name()?;
            let target = field.target_field_name.as_str();
            Some(if source == target || target.is_empty() {
                dialect.quote_identifier(source)
            } else {
                format!(
                    "{} AS {}",
                    dialect.quote_identifier(source),
                    dialect.quote_identifier(target)
                )
            })
        })
        .collect();
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };

    let mut query = format!(
        "SELECT {} FROM {}",
        projection,
        qualified_table(&mapping.source_db_name, &mapping.source_table)
    );
    if let Some(filter) = mapping.filter() {
        query.push(' ');
        query.push_str(&where_clause(filter));
    }
    query
}

/// Prefix `WHERE` unless the filter already starts with the keyword
pub fn where_clause(filter: &str) -> String {
    let filter = filter.trim();
    let has_keyword = filter
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("where"))
        && filter
            .get(5..)
            .is_some_and(|rest| rest.chars().next().is_none_or(char::is_whitespace));
    if has_keyword {
        filter.to_string()
    } else {
        format!("WHERE {}", filter)
    }
}
