use clap::Parser;
use ssm_build::core::ModelSpec;
use ssm_build::utils::error::ErrorSeverity;
use ssm_build::utils::{logger, validation::Validate};
use ssm_build::{BuildConfig, BuildEngine, CliArgs, PrecomputedArtifacts, Workspace};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入 TOML 配置
    let config = match BuildConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }

    tracing::info!("🚀 Starting ssm-build for '{}'", config.build.name);
    if args.verbose {
        tracing::debug!("Build config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    let spec = ModelSpec::from_file(&config.paths.model)?;
    spec.validate()?;
    let inputs = PrecomputedArtifacts::from_file(&config.paths.inputs)?;

    // 應用命令列覆蓋設定
    let mut options = config.build_options();
    if args.keep_existing {
        options.replace = false;
        tracing::warn!("🔧 Keeping existing workspace; stale files will not be removed");
    }
    if let Some(archive) = args.archive {
        options.archive = archive;
        tracing::info!("🔧 Archive overridden to: {}", archive);
    }

    let workspace = Workspace::new(&config.paths.workspace);
    let engine = BuildEngine::new(workspace, &inputs, &inputs, options);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let modules = engine.dry_run(&spec)?;
        for module in &modules {
            println!("  would render {}", module);
        }
        return Ok(());
    }

    match engine.run(&spec) {
        Ok(report) => {
            let summary = report.summary();
            tracing::info!("📊 Build summary: {:?}", summary);
            println!("✅ Build completed: {} modules rendered", report.modules.len());
            if let Some(path) = &report.archive_path {
                println!("📦 Archive: {}", path.display());
            } else {
                println!("📁 Workspace: {}", engine.workspace().root().display());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
