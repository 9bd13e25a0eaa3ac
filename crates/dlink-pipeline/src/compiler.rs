//! Job compilation

use std::sync::Arc;

use dlink_core::{CompilerConfig, Connection, DriverDescriptor, LinkError, Result};

use crate::catalog::{ConnectionCatalog, NoVirtualTables, VirtualTableLookup};
use crate::context::{Endpoint, GenerationContext};
use crate::generator::{GeneratorRegistry, StageGenerator};
use crate::job::JobDescriptor;
use crate::stage::PipelineDocument;

/// Compiles jobs into pipeline documents.
///
/// Every validation runs before the first stage is generated, so a job that
/// fails to compile never yields a partial document.
pub struct Compiler {
    config: CompilerConfig,
    generators: GeneratorRegistry,
    virtual_tables: Arc<dyn VirtualTableLookup + Send + Sync>,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            generators: GeneratorRegistry::default(),
            virtual_tables: Arc::new(NoVirtualTables),
        }
    }

    pub fn with_generators(mut self, generators: GeneratorRegistry) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_virtual_tables(mut self, lookup: Arc<dyn VirtualTableLookup + Send + Sync>) -> Self {
        self.virtual_tables = lookup;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    #[tracing::instrument(skip_all, fields(job = job.id, source = %source_descriptor.name, target = %target_descriptor.name))]
    pub fn compile(
        &self,
        job: &JobDescriptor,
        source: &Connection,
        source_descriptor: &DriverDescriptor,
        target: &Connection,
        target_descriptor: &DriverDescriptor,
    ) -> Result<PipelineDocument> {
        if job.table_mappings.is_empty() {
            return Err(LinkError::Configuration(format!(
                "job {} has no table mappings",
                job.id
            )));
        }
        let reader = self.generators.select(source_descriptor)?;
        let writer = self.generators.select(target_descriptor)?;
        check_role(source_descriptor, reader, Role::Source)?;
        check_role(target_descriptor, writer, Role::Sink)?;

        let mut ctx = GenerationContext::new(
            job,
            Endpoint::new(source, source_descriptor),
            Endpoint::new(target, target_descriptor),
            &self.config,
            &*self.virtual_tables,
        );
        let source_stages = reader.generate_source(&mut ctx)?;
        let transform_stages = reader.generate_transform(&mut ctx)?;
        let sink_stages = writer.generate_sink(&mut ctx)?;

        let document = PipelineDocument {
            env: job.env(),
            source: source_stages,
            transform: transform_stages,
            sink: sink_stages,
        };
        tracing::info!(
            job = job.id,
            reader = reader.name(),
            writer = writer.name(),
            stages = document.stage_count(),
            "compiled job"
        );
        Ok(document)
    }

    /// Resolve the job's connections and descriptors through `catalog`, then compile
    pub fn compile_job(&self, catalog: &dyn ConnectionCatalog, job: &JobDescriptor) -> Result<PipelineDocument> {
        let source = catalog.connection(job.source_connection_id)?;
        let target = catalog.connection(job.target_connection_id)?;
        let source_descriptor = catalog.descriptor(&source.connector)?;
        let target_descriptor = catalog.descriptor(&target.connector)?;
        self.compile(job, &source, &source_descriptor, &target, &target_descriptor)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Source,
    Sink,
}

fn check_role(descriptor: &DriverDescriptor, generator: &dyn StageGenerator, role: Role) -> Result<()> {
    let (declared, generated, label) = match role {
        Role::Source => (descriptor.supports_source, generator.emits_source(), "source"),
        Role::Sink => (descriptor.supports_sink, generator.emits_sink(), "sink"),
    };
    if declared && generated {
        Ok(())
    } else {
        Err(LinkError::Configuration(format!(
            "connector '{}' cannot be used as a {}",
            descriptor.name, label
        )))
    }
}
