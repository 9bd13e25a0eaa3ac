//! Hive sink stages

use std::io::Write;
use std::path::{Path, PathBuf};

use dlink_core::{DriverDescriptor, LinkError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{StageGenerator, qualified_table};
use crate::context::GenerationContext;
use crate::stage::Stage;

const PLUGIN: &str = "Hive";

pub const METASTORE_URI: &str = "metastore_uri";

/// Keys whose values are inline file contents, with the file name prefix
/// and suffix each is staged under
pub const HIVE_FILE_KEYS: &[(&str, &str, &str)] = &[
    ("hdfs_site_path", "hdfs-site", ".xml"),
    ("hive_site_path", "hive-site", ".xml"),
    ("kerberos_keytab_path", "hive-keytab", ".keytab"),
    ("krb5_path", "krb5", ".conf"),
];

/// Properties never forwarded in `hive.hadoop.conf`
const RESERVED: &[&str] = &[METASTORE_URI, "host", "port"];

#[derive(Debug, Clone, Copy, Default)]
pub struct HiveGenerator;

impl StageGenerator for HiveGenerator {
    fn name(&self) -> &'static str {
        "hive"
    }

    fn supports(&self, descriptor: &DriverDescriptor) -> bool {
        descriptor.family_is("Hive")
    }

    fn emits_source(&self) -> bool {
        false
    }

    fn generate_source(&self, _ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        Ok(Vec::new())
    }

    fn generate_sink(&self, ctx: &mut GenerationContext<'_>) -> Result<Vec<Stage>> {
        let target = ctx.target();
        let props = target.properties();
        let metastore = props
            .get(METASTORE_URI)
            .filter(|uri| !uri.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                LinkError::Configuration(format!(
                    "connector '{}' requires config key '{}'",
                    target.descriptor.name, METASTORE_URI
                ))
            })?;
        let hadoop_conf = hadoop_conf(&props);
        let keys = ctx.keys();

        let mut inputs = Vec::with_capacity(ctx.job().table_mappings.len());
        for mapping in &ctx.job().table_mappings {
            inputs.push((mapping, ctx.take_input(&mapping.source_table)?));
        }

        // Every mapping writes to the same metastore, so the files are staged once
        let staged = stage_files(ctx.config().staging_dir.as_deref(), &props)?;

        let mut stages = Vec::with_capacity(inputs.len());
        for (mapping, input) in inputs {
            let mut stage = Stage::new(PLUGIN);
            stage
                .set(&keys.input, input)
                .set(
                    "table_name",
                    qualified_table(&mapping.target_db_name, &mapping.target_table),
                )
                .set(METASTORE_URI, metastore.as_str());
            for (key, path) in &staged {
                stage.set(*key, path.display().to_string());
            }
            if !hadoop_conf.is_empty() {
                stage.set("hive.hadoop.conf", Value::Object(hadoop_conf.clone()));
            }
            stages.push(stage);
        }
        Ok(stages)
    }
}

/// Write every inline file to the staging directory.
///
/// Either all files are written or none remain.
fn stage_files(
    configured: Option<&Path>,
    props: &IndexMap<String, String>,
) -> Result<Vec<(&'static str, PathBuf)>> {
    let inline: Vec<_> = HIVE_FILE_KEYS
        .iter()
        .filter_map(|(key, prefix, suffix)| {
            props
                .get(*key)
                .filter(|contents| !contents.is_empty())
                .map(|contents| (*key, *prefix, *suffix, contents))
        })
        .collect();
    if inline.is_empty() {
        return Ok(Vec::new());
    }

    let staging = staging_dir(configured)?;
    let mut staged = Vec::with_capacity(inline.len());
    for (key, prefix, suffix, contents) in inline {
        match write_staged(&staging, prefix, suffix, contents) {
            Ok(path) => staged.push((key, path)),
            Err(e) => {
                for (_, path) in &staged {
                    if let Err(remove) = std::fs::remove_file(path) {
                        tracing::warn!(path = %path.display(), error = %remove, "failed to remove staged file");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(staged)
}

fn hadoop_conf(props: &IndexMap<String, String>) -> Map<String, Value> {
    props
        .iter()
        .filter(|(key, _)| {
            !RESERVED.contains(&key.as_str())
                && !HIVE_FILE_KEYS.iter().any(|(file_key, _, _)| *file_key == key.as_str())
        })
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

fn staging_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join("dlink-staging"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write `contents` to a new uniquely named file that outlives the compile
fn write_staged(dir: &Path, prefix: &str, suffix: &str, contents: &str) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)?;
    file.write_all(contents.as_bytes())?;
    let (_, path) = file.keep().map_err(|e| LinkError::Io(e.error))?;
    tracing::debug!(path = %path.display(), "staged hive config file");
    Ok(path)
}
