use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use wbmap_cli::input::read_headers;
use wbmap_map::{AutoMapper, AutoMapperConfig, AutoMapperResults};
use wbmap_model::{Schema, parse_segments};
use wbmap_rules::{Rules, StaleReference, default_rules, load_rules, rules_path_from_env};

use crate::cli::{CheckRulesArgs, MapArgs, SchemaArgs};
use crate::summary::print_tables;

const SCHEMA_ENV_VAR: &str = "WBMAP_SCHEMA";

pub fn run_map(args: &MapArgs) -> Result<AutoMapperResults> {
    let span = info_span!("map", base_table = %args.base_table);
    let _guard = span.enter();

    let schema = load_schema(&args.schema)?;
    let custom_rules;
    let rules: &Rules = match rules_path(args.rules.as_deref()) {
        Some(path) => {
            custom_rules = load_rules(&path).context("load rules")?;
            &custom_rules
        }
        None => default_rules().context("compile embedded rules")?,
    };
    let headers = read_headers(&args.headers)?;
    info!(header_count = headers.len(), source = %args.headers, "read headers");

    let mut config = AutoMapperConfig::new(headers, args.base_table.as_str())
        .with_scope(args.scope.into())
        .with_path_offset(args.path_offset);
    if let Some(table) = &args.starting_table {
        config = config.with_starting_table(table.as_str());
    }
    if let Some(path) = &args.path {
        let segments = parse_segments(path).with_context(|| format!("parse path '{path}'"))?;
        config = config.with_path(segments);
    }

    let start = Instant::now();
    let mapper = AutoMapper::new(&schema, rules, config).context("configure auto-mapper")?;
    let results = mapper.map().context("map headers")?;
    info!(
        mapped = results.mapped_headers().count(),
        unmapped = results.unmapped_headers().count(),
        ignored = results.ignored_headers().len(),
        duration_ms = start.elapsed().as_millis(),
        "mapping complete"
    );
    Ok(results)
}

pub fn run_tables(args: &SchemaArgs) -> Result<()> {
    let schema = load_schema(args)?;
    print_tables(&schema);
    Ok(())
}

pub fn run_check_rules(args: &CheckRulesArgs) -> Result<Vec<StaleReference>> {
    let schema = load_schema(&args.schema)?;
    let stale = match rules_path(args.rules.as_deref()) {
        Some(path) => load_rules(&path)
            .context("load rules")?
            .stale_references(&schema),
        None => default_rules()
            .context("compile embedded rules")?
            .stale_references(&schema),
    };
    info!(stale = stale.len(), "checked rules against schema");
    Ok(stale)
}

fn load_schema(args: &SchemaArgs) -> Result<Schema> {
    let path = schema_path(args.schema.as_deref()).ok_or_else(|| {
        anyhow!("no schema snapshot given: pass --schema or set {SCHEMA_ENV_VAR}")
    })?;
    let schema = Schema::from_path(&path)
        .with_context(|| format!("load schema {}", path.display()))?;
    info!(path = %path.display(), tables = schema.len(), "loaded schema");
    Ok(schema)
}

fn schema_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| std::env::var_os(SCHEMA_ENV_VAR).map(PathBuf::from))
}

fn rules_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(rules_path_from_env)
}
