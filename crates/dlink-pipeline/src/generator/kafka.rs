//! Kafka stages driven by virtual-table metadata
//!
//! Topics carry no schema. The virtual table of each mapped topic declares
//! its payload format and fields:
//!
//! - `text`: each field's path is a column position. The source parses
//!   positional columns and a SQL stage projects the mapped ones.
//! - `json`: the source reads each message as one raw column. A JSON path
//!   stage extracts the fields, then a field mapper renames them and drops
//!   the raw column.

use std::collections::HashSet;

use dlink_core::{DriverDescriptor, LinkError, Result, TableMapping};
use serde_json::{Map, Value, json};

use super::StageGenerator;
use crate::catalog::{PayloadFormat, VirtualField, VirtualTable};
use crate::context::GenerationContext;
use crate::stage::Stage;

const PLUGIN: &str = "Kafka";

/// Most columns a positional `text` schema may have
pub const MAX_TEXT_COLUMNS: usize = 4096;

/// Name prefix of the filler columns in a positional schema
pub const PLACEHOLDER_PREFIX: &str = "_unused_";

#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaGenerator;

impl StageGenerator for KafkaGenerator {
    fn name(&self) -> &'static str {
        "kafka"
    }

    fn supports(&self, descriptor: &DriverDescriptor) -> bool {
        descriptor.family_is("Kafka")
    }

    fn generate_source(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let source = ctx.source();
        let props = source.properties();
        let raw_field = ctx.config().json_source_field.as_str();
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let table = source_table(ctx, mapping)?;
            let output = ctx.allocate_source_name(&mapping.source_table)?;
            let schema = match table.format()? {
                PayloadFormat::Text => text_schema(&table.fields)?,
                PayloadFormat::Json => {
                    let mut fields = Map::new();
                    fields.insert(raw_field.to_string(), Value::from("string"));
                    fields
                }
            };

            let mut stage = Stage::new(PLUGIN);
            stage.extend_props(&props);
            for (key, value) in &table.format_config {
                stage.set(key.as_str(), value.clone());
            }
            stage
                .set("format", "text")
                .set("schema", json!({ "fields": schema }))
                .set(&keys.output, output);
            stages.push(stage);
        }
        Ok(stages)
    }

    fn generate_transform(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let raw_field = ctx.config().json_source_field.as_str();
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let table = source_table(ctx, mapping)?;
            let fields = mapped_fields(&table, mapping)?;
            match table.format()? {
                PayloadFormat::Text => {
                    let input = ctx.take_input(&mapping.source_table)?;
                    let output = ctx.allocate_transform_name(&mapping.source_table)?;
                    let projection: Vec<String> = fields
                        .iter()
                        .map(|(field, target)| {
                            if field.name == *target {
                                field.name.clone()
                            } else {
                                format!("{} AS {}", field.name, target)
                            }
                        })
                        .collect();
                    let query = format!("SELECT {} FROM {}", projection.join(", "), input);
                    let mut stage = Stage::new("Sql");
                    stage
                        .set(&keys.input, input)
                        .set(&keys.output, output)
                        .set("query", query);
                    stages.push(stage);
                }
                PayloadFormat::Json => {
                    let input = ctx.take_input(&mapping.source_table)?;
                    let extracted = ctx.allocate_extract_name(&mapping.source_table)?;
                    let columns: Vec<Value> = fields
                        .iter()
                        .map(|(field, _)| {
                            json!({
                                "src_field": raw_field,
                                "path": field.path,
                                "dest_field": field.name,
                                "dest_type": field.data_type,
                            })
                        })
                        .collect();
                    let mut extract = Stage::new("JsonPath");
                    extract
                        .set(&keys.input, input)
                        .set(&keys.output, extracted.as_str())
                        .set("columns", columns);
                    stages.push(extract);

                    ctx.consume(&extracted)?;
                    let output = ctx.allocate_transform_name(&mapping.source_table)?;
                    let renames: Map<String, Value> = fields
                        .iter()
                        .map(|(field, target)| (field.name.clone(), Value::from(*target)))
                        .collect();
                    let mut rename = Stage::new("FieldMapper");
                    rename
                        .set(&keys.input, extracted)
                        .set(&keys.output, output)
                        .set("field_mapper", renames);
                    stages.push(rename);
                }
            }
        }
        Ok(stages)
    }

    fn generate_sink(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let target = ctx.target();
        let props = target.properties();
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let table = ctx.virtual_tables().virtual_table(
                target.connection_id(),
                &mapping.target_db_name,
                &mapping.target_table,
            )?;
            let input = ctx.take_input(&mapping.source_table)?;
            let mut stage = Stage::new(PLUGIN);
            stage.extend_props(&props);
            for (key, value) in &table.format_config {
                stage.set(key.as_str(), value.clone());
            }
            stage.set(&keys.input, input);
            stages.push(stage);
        }
        Ok(stages)
    }
}

fn source_table(ctx: &GenerationContext<'_>, mapping: &TableMapping) -> Result<VirtualTable> {
    ctx.virtual_tables().virtual_table(
        ctx.source().connection_id(),
        &mapping.source_db_name,
        &mapping.source_table,
    )
}

/// Virtual fields the mapping reads, paired with their target names.
///
/// A mapping without source fields reads every declared field unrenamed.
fn mapped_fields<'t>(
    table: &'t VirtualTable,
    mapping: &'t TableMapping,
) -> Result<Vec<(&'t VirtualField, &'t str)>> {
    let mapped: Vec<_> = mapping
        .fields
        .iter()
        .filter_map(|f| f.source_name().map(|source| (source, f.target_field_name.as_str())))
        .collect();
    if mapped.is_empty() {
        return Ok(table.fields.iter().map(|f| (f, f.name.as_str())).collect());
    }
    mapped
        .into_iter()
        .map(|(source, target)| {
            let field = table.field(source).ok_or_else(|| {
                LinkError::Configuration(format!(
                    "virtual table {}.{} has no field '{}'",
                    mapping.source_db_name, mapping.source_table, source
                ))
            })?;
            let target = if target.is_empty() { field.name.as_str() } else { target };
            Ok((field, target))
        })
        .collect()
}

/// Positional column schema for a `text` payload.
///
/// Every position from 0 to the highest declared index gets exactly one
/// column; undeclared positions are filled with string placeholders whose
/// names never clash with a declared field.
pub fn text_schema(fields: &[VirtualField]) -> Result<Map<String, Value>> {
    let mut slots: Vec<Option<&VirtualField>> = Vec::new();
    let mut declared: HashSet<String> = HashSet::new();
    for field in fields {
        let position = field.position().ok_or_else(|| {
            LinkError::Configuration(format!(
                "text field '{}' has a non-numeric path '{}'",
                field.name, field.path
            ))
        })?;
        let len = position
            .checked_add(1)
            .filter(|len| *len <= MAX_TEXT_COLUMNS)
            .ok_or_else(|| {
                LinkError::Configuration(format!(
                    "text field '{}' uses position {}, a text payload has at most {} columns",
                    field.name, field.path, MAX_TEXT_COLUMNS
                ))
            })?;
        if slots.len() < len {
            slots.resize(len, None);
        }
        if let Some(existing) = slots[position] {
            return Err(LinkError::Configuration(format!(
                "text fields '{}' and '{}' both use position {}",
                existing.name, field.name, position
            )));
        }
        if !declared.insert(field.name.clone()) {
            return Err(LinkError::Configuration(format!(
                "text field '{}' is declared more than once",
                field.name
            )));
        }
        slots[position] = Some(field);
    }
    if slots.is_empty() {
        return Err(LinkError::Configuration(
            "a text virtual table needs at least one field".to_string(),
        ));
    }

    let mut schema = Map::new();
    for (position, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(field) => {
                schema.insert(field.name.clone(), Value::from(field.data_type.as_str()));
            }
            None => {
                let mut name = format!("{}{}", PLACEHOLDER_PREFIX, position);
                while declared.contains(&name) {
                    name.push('_');
                }
                schema.insert(name, Value::from("string"));
            }
        }
    }
    Ok(schema)
}
