use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use log::{debug, error};
use nc2json::cli::{Cli, Commands, ConfigFormat, ConvertArgs, OutputFormat, resolve_job_config};
use nc2json::info::{get_netcdf_info, print_file_info_human, print_file_info_json, print_file_info_yaml};
use nc2json::input::JobConfig;
use nc2json::log::{config_echo, show_farewell_with_timing, show_greeting};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(log::LevelFilter::Error);
    }
    builder.format_timestamp(None).init();
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert(args) => convert(cli.config.as_ref(), &args),
        Commands::Validate { config_file } => validate(config_file.or(cli.config)),
        Commands::Info {
            file,
            variable,
            detailed,
            format,
        } => {
            let info = get_netcdf_info(&file, variable.as_deref(), detailed)?;
            match format {
                OutputFormat::Human => print_file_info_human(&info),
                OutputFormat::Json => print_file_info_json(&info)?,
                OutputFormat::Yaml => print_file_info_yaml(&info)?,
            }
            Ok(())
        }
        Commands::Template { output, format } => template(output.as_deref(), format),
        Commands::Completions { shell, output } => {
            let mut command = Cli::command();
            match output {
                Some(path) => {
                    let mut file = fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    generate(shell, &mut command, "nc2json", &mut file);
                }
                None => generate(shell, &mut command, "nc2json", &mut io::stdout()),
            }
            Ok(())
        }
    }
}

fn convert(config_path: Option<&PathBuf>, args: &ConvertArgs) -> Result<()> {
    let start_time = Instant::now();

    let config_source = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    show_greeting(&config_source);

    let config = resolve_job_config(config_path, args).context("Invalid configuration")?;
    config_echo(&config);

    if args.dry_run {
        println!("\nDry run: configuration is valid, nothing written.");
        return Ok(());
    }

    nc2json::run(&config).with_context(|| format!("Failed to export {}", config.nc_key))?;

    show_farewell_with_timing(start_time.elapsed());
    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.context("No configuration file given (pass a path or use --config)")?;
    debug!("Validating {}", path.display());
    let config = JobConfig::from_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("{} is not a valid configuration", path.display()))?;

    println!("Configuration is valid: {}", path.display());
    config_echo(&config);
    Ok(())
}

fn template(output: Option<&Path>, format: ConfigFormat) -> Result<()> {
    let config = JobConfig::default();
    let text = match format {
        ConfigFormat::Json => config.to_json()?,
        ConfigFormat::Yaml => config.to_yaml()?,
    };
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Template written to: {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}
