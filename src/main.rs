mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{BuildArgs, CheckArgs, Cli, Commands, NormalizeArgs, SplitArgs};
use doc_splitter::{
    check_sources, BuildConfig, BuildReport, DocumentationBuilder, PathNormalizer,
    RedirectDecision, RedirectMiddleware,
};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match BuildConfig::load(cli.config.as_deref()) {
        Ok(config) => match &cli.command {
            Commands::Build(args) => handle_build_command(args, config).await,
            Commands::Split(args) => handle_split_command(args, config).await,
            Commands::Check(args) => handle_check_command(args, &config).await,
            Commands::Normalize(args) => handle_normalize_command(args, &config),
        },
        Err(e) => Err(anyhow::Error::from(e).context("Failed to load configuration")),
    };

    if let Err(e) = result {
        error!("Operation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_build_command(args: &BuildArgs, mut config: BuildConfig) -> anyhow::Result<()> {
    if let Some(src) = &args.src {
        config.src_dir = src.clone();
    }
    if let Some(out) = &args.out {
        config.build_dir = out.clone();
    }

    let languages: Vec<_> = config.languages.iter().map(|l| l.tag()).collect();
    info!(
        "Building {} for languages: {}",
        config.src_dir.display(),
        languages.join(", ")
    );

    let builder = DocumentationBuilder::new(config);
    let report = builder.build_all().await.context("Build failed")?;

    if args.manifest {
        builder
            .write_manifest(&report)
            .await
            .context("Failed to write build manifest")?;
    }

    print_summary(&report);
    Ok(())
}

async fn handle_split_command(args: &SplitArgs, config: BuildConfig) -> anyhow::Result<()> {
    info!("Starting split operation with {} files", args.files.len());

    // Check if output directory exists and handle force flag
    if args.out.exists() && !args.force {
        let mut entries = std::fs::read_dir(&args.out)
            .with_context(|| format!("Cannot read output directory {}", args.out.display()))?;
        if entries.next().is_some() {
            bail!("Output directory is not empty. Use --force to overwrite.");
        }
    }

    let languages = if args.languages.is_empty() {
        config.languages.clone()
    } else {
        args.languages.clone()
    };

    let builder = DocumentationBuilder::new(config);
    let mut report = BuildReport::default();
    for (idx, file) in args.files.iter().enumerate() {
        info!("Processing file {}/{}: {}", idx + 1, args.files.len(), file.display());
        let file_report = builder
            .split_file(file, &args.out, &languages)
            .await
            .with_context(|| format!("Failed to split {}", file.display()))?;
        report.merge(file_report);
    }

    for output in &report.outputs {
        info!("  - {}", output.output.display());
    }
    info!("Split operation completed successfully!");
    Ok(())
}

async fn handle_check_command(args: &CheckArgs, config: &BuildConfig) -> anyhow::Result<()> {
    let paths = if args.paths.is_empty() {
        vec![config.src_dir.clone()]
    } else {
        args.paths.clone()
    };

    let report = check_sources(&paths).await?;

    println!("\n=== Check Summary ===");
    println!("Documents checked: {}", report.checked);
    println!("Conditional blocks: {}", report.regions);

    if !report.is_ok() {
        println!("Invalid documents:");
        for failure in &report.failures {
            println!("  - {}", failure.message);
        }
        bail!("{} documents failed validation", report.failures.len());
    }

    println!("All documents are valid!");
    Ok(())
}

fn handle_normalize_command(args: &NormalizeArgs, config: &BuildConfig) -> anyhow::Result<()> {
    let middleware = RedirectMiddleware::new(&config.redirect_prefixes);

    for path in &args.paths {
        let normalization = PathNormalizer::normalize(path);
        let decision = middleware.handle(path);

        if args.json {
            let line = serde_json::json!({
                "path": path,
                "should_redirect": normalization.should_redirect,
                "target_path": normalization.target_path,
                "middleware": decision,
            });
            println!("{}", serde_json::to_string(&line)?);
            continue;
        }

        match decision {
            RedirectDecision::Redirect { location, status } => {
                println!("{} -> {} ({})", path, location, status)
            }
            RedirectDecision::PassThrough if normalization.should_redirect => {
                println!("{} -> {} (outside redirect prefixes)", path, normalization.target_path)
            }
            RedirectDecision::PassThrough => println!("{} (unchanged)", path),
        }
    }

    Ok(())
}

fn print_summary(report: &BuildReport) {
    println!("\n=== Build Summary ===");
    println!("Files written: {}", report.built);
    println!("Files skipped: {}", report.skipped);
}
