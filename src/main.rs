use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use schemadoc::catalog::loader::load_catalog;
use schemadoc::cli::{
    AnnotationsArgs, Cli, Command, CrawlArgs, DbmlArgs, DictionaryArgs, ErdArgs, RunnerKind,
};
use schemadoc::convert::{self, prepare_catalog};
use schemadoc::crawl::{Runner, SchemaCrawlerInvocation};
use schemadoc::graph;
use schemadoc::logging;
use schemadoc::render::{self, output_writer};

#[cfg(not(tarpaulin_include))]
fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl(args) => run_crawl(args),
        Command::Dbml(args) => run_dbml(args),
        Command::Dictionary(args) => run_dictionary(args),
        Command::Erd(args) => run_erd(args),
        Command::Annotations(args) => run_annotations(args),
        Command::Inspect(args) => inspect::run(args),
    }
}

#[cfg(not(tarpaulin_include))]
fn run_crawl(args: CrawlArgs) -> Result<()> {
    let runner = match args.runner {
        RunnerKind::Docker => Runner::Docker {
            image: args.image,
            share_dir: args
                .share_dir
                .canonicalize()
                .with_context(|| format!("Share folder does not exist: {}", args.share_dir.display()))?,
        },
        RunnerKind::Native => Runner::Native {
            executable: args.executable,
        },
    };

    let invocation = SchemaCrawlerInvocation {
        server: Some(args.server),
        database: args.database,
        host: args.host,
        port: args.port,
        user: args.user,
        password: args.password,
        command: args.command,
        info_level: args.info_level,
        output_format: args.output_format,
        output_file: args.output_file,
        include_tables: args.include_tables,
        exclude_tables: args.exclude_tables,
        title: args.title,
        load_config: args.load_config,
        load_extension: args.load_extension,
        attributes_file: args.attributes_file,
    };

    if args.dry_run {
        println!("{}", invocation.display(&runner));
        return Ok(());
    }

    invocation.run(&runner)?;
    eprintln!("{} SchemaCrawler finished", "✓".green());
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn run_dbml(args: DbmlArgs) -> Result<()> {
    let options = args.export.catalog_options();
    let input = &args.export.input;

    if input.is_dir() {
        let output_dir = args.output.as_deref().unwrap_or(input);
        let outcome = convert::convert_folder(input, output_dir, args.style, &options)?;

        if outcome.converted.is_empty() && outcome.failed.is_empty() {
            eprintln!("{} No JSON exports found in {}", "!".yellow(), input.display());
            return Ok(());
        }
        for (source, target, tables) in &outcome.converted {
            eprintln!(
                "{} {} -> {} ({} tables)",
                "✓".green(),
                source.display(),
                target.display(),
                tables
            );
        }
        for (source, error) in &outcome.failed {
            eprintln!("{} {}: {:#}", "✗".red(), source.display(), error);
        }
        eprintln!(
            "{} converted, {} failed",
            outcome.converted.len().to_string().bold(),
            outcome.failed.len().to_string().bold()
        );
        if !outcome.is_success() {
            anyhow::bail!("{} of the exports could not be converted", outcome.failed.len());
        }
        return Ok(());
    }

    match &args.output {
        Some(output) => {
            let tables = convert::convert_to_dbml(input, output, args.style, &options)?;
            eprintln!("{} Wrote {} tables to {}", "✓".green(), tables, output.display());
        }
        None => {
            let prepared = prepare_catalog(input, &options)?;
            let mut writer = output_writer(None)?;
            render::dbml::render_dbml_to_writer(&prepared.catalog, args.style, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn run_dictionary(args: DictionaryArgs) -> Result<()> {
    let prepared = prepare_catalog(&args.export.input, &args.export.catalog_options())?;
    let rows = render::dictionary::dictionary_rows(&prepared.catalog);
    if rows.is_empty() {
        tracing::warn!(input = %args.export.input.display(), "no columns found; nothing written");
        return Ok(());
    }

    let output = args.output_path();
    let mut writer = output_writer(output.as_deref())?;
    render::dictionary::render_dictionary_to_writer(&rows, args.format, &mut writer)?;
    writer.flush()?;

    if let Some(path) = output {
        report_written(&path, rows.len(), "columns");
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn run_erd(args: ErdArgs) -> Result<()> {
    let prepared = prepare_catalog(&args.export.input, &args.export.catalog_options())?;
    let mut relationships = graph::builder::build_graph(&prepared.catalog, &prepared.weak_associations);

    if let Some(table) = &args.table {
        relationships = graph::filter::focus_graph(&relationships, table, args.parents, args.children)?;
    }

    let mut writer = output_writer(args.output.as_deref())?;
    render::render_erd_to_writer(&relationships, args.format, &mut writer)?;
    writer.flush()?;

    if let Some(path) = &args.output {
        report_written(path, relationships.node_count(), "tables");
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn run_annotations(args: AnnotationsArgs) -> Result<()> {
    let catalog = load_catalog(&args.input)?;
    let mut writer = output_writer(args.output.as_deref())?;
    render::annotations::render_annotations_to_writer(&catalog, &mut writer)?;
    writer.flush()?;

    if let Some(path) = &args.output {
        report_written(path, catalog.tables.len(), "tables");
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn report_written(path: &Path, count: usize, what: &str) {
    eprintln!("{} Wrote {} {} to {}", "✓".green(), count, what, path.display());
}

#[cfg(feature = "postgres")]
mod inspect {
    use std::io::{self, Write};

    use anyhow::{Context, Result};

    use schemadoc::cli::{InspectArgs, InspectCommand};
    use schemadoc::investigator::config::ConnectionConfig;
    use schemadoc::investigator::features::FEATURES;
    use schemadoc::investigator::postgres::PostgresSource;
    use schemadoc::investigator::trace::{SchemaScope, SearchPairs, TraceOptions};
    use schemadoc::investigator::{metadata, origin, report, trace, uniqueness};

    #[cfg(not(tarpaulin_include))]
    pub fn run(args: InspectArgs) -> Result<()> {
        if let InspectCommand::Features = args.command {
            return Ok(report::write_features(FEATURES, &mut io::stdout().lock())?);
        }

        let config = ConnectionConfig::from_settings(args.connection.into())?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start the async runtime")?;
        runtime.block_on(run_command(config, args.command))
    }

    #[cfg(not(tarpaulin_include))]
    async fn run_command(config: ConnectionConfig, command: InspectCommand) -> Result<()> {
        let source = PostgresSource::connect(&config).await?;
        let mut out = io::stdout().lock();

        match command {
            InspectCommand::Features => report::write_features(FEATURES, &mut out)?,
            InspectCommand::Tables { schema, all_schemas } => {
                let entries = metadata::list_tables(&source, &SchemaScope::new(&schema, all_schemas)).await?;
                report::write_tables(&entries, &mut out)?;
            }
            InspectCommand::Describe { table, schema } => {
                let columns = metadata::describe_table(&source, &schema, &table).await?;
                writeln!(out, "Structure of {}.{}:", schema, table)?;
                report::write_description(&columns, &mut out)?;
            }
            InspectCommand::Trace {
                pairs,
                mode,
                schema,
                all_schemas,
                show_records,
                limit,
            } => {
                let given = pairs.len();
                let pairs: SearchPairs = pairs.into_iter().collect();
                if pairs.len() < given {
                    tracing::warn!("a column was given more than once; its last value is used");
                }
                let options = TraceOptions {
                    mode,
                    scope: SchemaScope::new(&schema, all_schemas),
                    show_records,
                    limit,
                };
                let result = trace::trace(&source, &pairs, &options).await?;
                report::write_trace_report(&result, &mut out)?;
            }
            InspectCommand::Origin { file } => {
                let content = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let json: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid JSON in {}", file.display()))?;
                let (result, analysis) = origin::trace_origin(&source, &json).await?;
                report::write_trace_report(&result, &mut out)?;
                writeln!(out)?;
                report::write_origin_analysis(&analysis, &mut out)?;
            }
            InspectCommand::Unique { table, columns, schema } => {
                let result = uniqueness::check_uniqueness(&source, &schema, &table, &columns).await?;
                writeln!(out, "Checking uniqueness of [{}] in {}.{}", columns.join(", "), schema, table)?;
                report::write_uniqueness(&columns, &result, &mut out)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

#[cfg(not(feature = "postgres"))]
mod inspect {
    use anyhow::Result;
    use std::io;

    use schemadoc::cli::{InspectArgs, InspectCommand};
    use schemadoc::investigator::features::FEATURES;
    use schemadoc::investigator::report;

    pub fn run(args: InspectArgs) -> Result<()> {
        if let InspectCommand::Features = args.command {
            return Ok(report::write_features(FEATURES, &mut io::stdout().lock())?);
        }
        anyhow::bail!("PostgreSQL support not enabled. Rebuild with --features postgres");
    }
}
