//! Change-data-capture source stages

use dlink_core::{DriverDescriptor, LinkError, Result};
use serde_json::Value;

use super::{StageGenerator, qualified_table};
use crate::context::GenerationContext;
use crate::stage::Stage;

/// Covers every family ending in `CDC`. The plugin is the family itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CdcGenerator;

impl StageGenerator for CdcGenerator {
    fn name(&self) -> &'static str {
        "cdc"
    }

    fn supports(&self, descriptor: &DriverDescriptor) -> bool {
        descriptor.family_ends_with("CDC")
    }

    fn emits_sink(&self) -> bool {
        false
    }

    fn generate_source(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let source = ctx.source();
        let props = source.properties();
        let url = props.get("url").cloned().ok_or_else(|| {
            LinkError::Configuration(format!(
                "connector '{}' requires config key 'url'",
                source.descriptor.name
            ))
        })?;
        let keys = ctx.keys();

        let mut stages = Vec::new();
        for mapping in &ctx.job().table_mappings {
            let output = ctx.allocate_source_name(&mapping.source_table)?;
            let mut stage = Stage::new(source.descriptor.family.as_str());
            stage.extend_props(&props);
            stage.set("base-url", url.as_str());
            if let Some(user) = &source.connection.user {
                stage.set("username", user.as_str());
            }
            let table = qualified_table(&mapping.source_db_name, &mapping.source_table);
            stage
                .set("table-names", vec![Value::String(table)])
                .set(&keys.output, output);
            stages.push(stage);
        }
        Ok(stages)
    }

    fn generate_sink(&self, _ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        Ok(Vec::new())
    }
}
