use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use canon_cli::batch::{collect_runs, load_resources};
use canon_core::{TransformManager, build_default_registry};
use canon_map::{ConceptMapRegistry, MemoryIssueSink, PassthroughRegistry, TerminologyRegistry};
use canon_model::{PipelineOptions, Tenant};

use crate::cli::TransformArgs;
use crate::summary::apply_table_style;
use crate::types::TransformResult;

pub fn run_profiles() -> Result<()> {
    let registry =
        build_default_registry(Arc::new(PassthroughRegistry)).context("build profile registry")?;
    let mut table = Table::new();
    table.set_header(vec!["Resource", "Kind", "Profile", "Description"]);
    apply_table_style(&mut table);
    for resource_type in registry.resource_types() {
        for transformer in registry.get(resource_type) {
            let kind = if transformer.is_default() {
                "default"
            } else {
                "specific"
            };
            table.add_row(vec![
                resource_type,
                kind,
                transformer.profile(),
                transformer.description(),
            ]);
        }
    }
    println!("{table}");
    Ok(())
}

pub fn run_transform(args: &TransformArgs) -> Result<TransformResult> {
    let tenant = Tenant::new(args.tenant.as_str())?;
    let span = info_span!("batch", tenant = tenant.mnemonic());
    let _guard = span.enter();

    let options = build_options(args);
    let registry: Arc<dyn TerminologyRegistry> = match &args.concept_map {
        Some(path) => Arc::new(ConceptMapRegistry::load(path)?),
        None => Arc::new(PassthroughRegistry),
    };
    let sink = Arc::new(MemoryIssueSink::new());
    let profiles =
        build_default_registry(Arc::clone(&registry)).context("build profile registry")?;
    let manager = TransformManager::new(profiles, registry, Arc::clone(&sink) as _, options);

    let resources = load_resources(&args.input)?;
    info!(count = resources.len(), "resources loaded");

    let start = Instant::now();
    let runs = manager.execute_batch(&resources, &tenant, args.force_reload);
    let (output, types) = collect_runs(&resources, runs)?;
    info!(
        transformed = output.resources.len(),
        embedded = output.embedded.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch complete"
    );

    let output_path = if args.dry_run {
        None
    } else {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| args.input.with_extension("transformed.json"));
        output.write(&path)?;
        Some(path)
    };

    let has_errors = types.iter().any(|summary| summary.aborted > 0);
    Ok(TransformResult {
        tenant: tenant.to_string(),
        input: args.input.clone(),
        output: output_path,
        types,
        reports: sink.reports(),
        has_errors,
    })
}

fn build_options(args: &TransformArgs) -> PipelineOptions {
    let options = if args.strict {
        PipelineOptions::strict()
    } else {
        PipelineOptions::default()
    };
    options
        .with_localize_embedded(!args.no_localize_embedded)
        .with_report_warnings(!args.no_report_warnings)
}
