use std::env;
use std::path::PathBuf;

use edu_offline::AppConfig;

fn print_usage() {
    eprintln!("Usage: edu-offline [MODE] [OPTIONS]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  (default)             Launch interactive TUI");
    eprintln!("  --sync                Run one sync pass over the selected folders and exit");
    eprintln!("  --watch               Sync periodically until interrupted (headless)");
    eprintln!("  --list [PREFIX]       Print the remote entries below PREFIX (root if omitted)");
    eprintln!("  --select <FOLDER/>    Add a folder to the selection");
    eprintln!("  --unselect <FOLDER/>  Remove a folder from the selection");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>       Config file (default: {})", AppConfig::default_path().display());
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EDU_OFFLINE_API_URL   Listing endpoint override");
    eprintln!("  EDU_OFFLINE_DATA_DIR  Data directory override (selection, mirror, log)");
    eprintln!("  RUST_LOG              Log filter (default: info)");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Tui,
    Sync,
    Watch,
    List(String),
    Select(String),
    Unselect(String),
}

fn required_value(args: &[String], i: usize, flag: &str) -> String {
    if let Some(value) = args.get(i) {
        value.clone()
    } else {
        eprintln!("Error: {flag} requires a value");
        std::process::exit(1);
    }
}

/// Routes log output to the data directory in TUI mode so it does not
/// corrupt the screen; stderr otherwise.
fn init_logging(mode: &Mode, config: &AppConfig) -> edu_offline::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    if *mode == Mode::Tui {
        std::fs::create_dir_all(&config.paths.data_dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.paths.log_file())?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> edu_offline::Result<()> {
    let mut mode = Mode::Tui;
    let mut config_path: Option<PathBuf> = None;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--sync" => mode = Mode::Sync,
            "--watch" => mode = Mode::Watch,
            "--list" => {
                // Prefix is optional; the root is listed without one.
                let prefix = match args.get(i + 1) {
                    Some(next) if !next.starts_with('-') => {
                        i += 1;
                        next.clone()
                    }
                    _ => String::new(),
                };
                mode = Mode::List(prefix);
            }
            "--select" => {
                i += 1;
                mode = Mode::Select(required_value(&args, i, "--select"));
            }
            "--unselect" => {
                i += 1;
                mode = Mode::Unselect(required_value(&args, i, "--unselect"));
            }
            "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(required_value(&args, i, "--config")));
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Error: unknown argument '{other}'");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config_path = config_path.unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_or_create(&config_path)?.with_env_overrides();
    init_logging(&mode, &config)?;
    log::debug!("Loaded config from {}", config_path.display());

    match mode {
        Mode::Tui => {
            #[cfg(feature = "tui")]
            {
                edu_offline::tui::run(&config).await
            }
            #[cfg(not(feature = "tui"))]
            {
                eprintln!("TUI support not compiled in; use --sync or --watch");
                std::process::exit(1);
            }
        }
        #[cfg(feature = "cli")]
        Mode::Sync => edu_offline::cli::run_sync(&config).await.map(|_| ()),
        #[cfg(feature = "cli")]
        Mode::Watch => edu_offline::cli::run_watch(&config).await,
        #[cfg(feature = "cli")]
        Mode::List(prefix) => edu_offline::cli::run_list(&config, &prefix).await,
        #[cfg(feature = "cli")]
        Mode::Select(folder) => edu_offline::cli::run_select(&config, &folder, true).map(|_| ()),
        #[cfg(feature = "cli")]
        Mode::Unselect(folder) => edu_offline::cli::run_select(&config, &folder, false).map(|_| ()),
        #[cfg(not(feature = "cli"))]
        _ => {
            eprintln!("CLI support not compiled in");
            std::process::exit(1);
        }
    }
}
