use crate::{
    catalog::{self, Project},
    config::{self, AppConfig},
    editor::{self, EditorId, EditorPaths},
    error::OpenerError,
    launcher::{self, DirectoryLauncherStore, Launcher, LauncherStore},
    logging,
    reconcile::Session,
    selection::SelectionState,
    ui,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const MISSING_EDITOR: &str = "an argument is missing: editor (e.g. 'vscode', 'vscodium')";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            _ => bail!("Unknown format: {value} (use 'text' or 'json')"),
        }
    }
}

#[derive(Debug, Default)]
struct GlobalOptions {
    format: Option<OutputFormat>,
    page_size: Option<usize>,
    launcher_dir: Option<PathBuf>,
}

impl GlobalOptions {
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Text)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(dir) = &self.launcher_dir {
            config.launcher_dir = Some(dir.clone());
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Select { editor: Option<String> },
    List { editor: Option<String> },
    Launchers,
    Paths { editor: Option<String> },
    Help,
    Version,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (action, options) = parse_args(&args)?;
    match action {
        CliAction::Help => {
            print_help();
            return Ok(());
        }
        CliAction::Version => {
            println!("Code Opener v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let mut config = AppConfig::load_or_create()?;
    options.apply(&mut config);
    let data_dir = config::base_data_dir()?;
    // A missing log file must not keep the picker from running.
    if let Some(warning) = start_logging(&data_dir) {
        eprintln!("{warning}");
    }
    info!(action = ?action, "starting");

    let result = match action {
        CliAction::Select { editor } => run_selection(&config, editor.as_deref()),
        CliAction::List { editor } => list_projects(&config, editor.as_deref(), options.format()),
        CliAction::Launchers => list_launchers(&config, options.format()),
        CliAction::Paths { editor } => list_paths(&config, editor.as_deref(), options.format()),
        CliAction::Help | CliAction::Version => Ok(()),
    };
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

fn start_logging(data_dir: &Path) -> Option<String> {
    match logging::init(data_dir) {
        Ok(_) => None,
        Err(err) => Some(format!("Warning: no log file will be written ({err:#})")),
    }
}

fn parse_args(args: &[String]) -> Result<(CliAction, GlobalOptions)> {
    let mut options = GlobalOptions::default();
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok((CliAction::Help, options)),
            "-V" | "--version" => return Ok((CliAction::Version, options)),
            "--format" => {
                let value = iter.next().context("--format requires a value")?;
                options.format = Some(OutputFormat::parse(value)?);
            }
            "--page-size" => {
                let value = iter.next().context("--page-size requires a value")?;
                options.page_size = Some(parse_page_size(value)?);
            }
            "--launcher-dir" => {
                let value = iter.next().context("--launcher-dir requires a path")?;
                options.launcher_dir = Some(PathBuf::from(value));
            }
            value if value.starts_with("--format=") => {
                options.format = Some(OutputFormat::parse(value.trim_start_matches("--format="))?);
            }
            value if value.starts_with("--page-size=") => {
                options.page_size = Some(parse_page_size(value.trim_start_matches("--page-size="))?);
            }
            value if value.starts_with("--launcher-dir=") => {
                options.launcher_dir =
                    Some(PathBuf::from(value.trim_start_matches("--launcher-dir=")));
            }
            value if value.starts_with('-') => bail!("Unknown option: {value}"),
            _ => tokens.push(arg.clone()),
        }
    }

    let mut tokens = tokens.into_iter();
    let head = tokens.next();
    let action = match head.as_deref() {
        None => CliAction::Select { editor: None },
        Some("help") => CliAction::Help,
        Some("version") => CliAction::Version,
        Some("list") => CliAction::List {
            editor: tokens.next(),
        },
        Some("launchers") => CliAction::Launchers,
        Some("paths") => CliAction::Paths {
            editor: tokens.next(),
        },
        Some(_) => CliAction::Select { editor: head.clone() },
    };
    if let Some(extra) = tokens.next() {
        bail!("Unexpected argument: {extra}");
    }

    Ok((action, options))
}

fn parse_page_size(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => bail!("--page-size must be a positive number, got '{value}'"),
    }
}

fn resolve_editor(config: &AppConfig, arg: Option<&str>) -> Result<EditorId, OpenerError> {
    match arg {
        Some(value) => EditorId::parse(value),
        None => config
            .default_editor
            .ok_or_else(|| OpenerError::Configuration(MISSING_EDITOR.to_string())),
    }
}

fn resolve_editor_paths(config: &AppConfig, arg: Option<&str>) -> Result<EditorPaths, OpenerError> {
    let editor = resolve_editor(config, arg)?;
    editor::detect_paths(editor, &config.editor_override(editor))
}

fn open_store(config: &AppConfig) -> Result<DirectoryLauncherStore, OpenerError> {
    let dir = match &config.launcher_dir {
        Some(dir) => dir.clone(),
        None => launcher::default_launcher_dir()?,
    };
    Ok(DirectoryLauncherStore::new(dir))
}

fn load_startup(
    config: &AppConfig,
    editor: Option<&str>,
) -> Result<(EditorPaths, Vec<Project>, DirectoryLauncherStore, Vec<Launcher>), OpenerError> {
    let paths = resolve_editor_paths(config, editor)?;
    let projects = catalog::load_recent_projects(&paths.state_db)
        .map_err(|err| OpenerError::unavailable("recent projects", err))?;
    let store = open_store(config)?;
    let launchers = store
        .list()
        .map_err(|err| OpenerError::unavailable("launcher directory", err))?;
    Ok((paths, projects, store, launchers))
}

fn run_selection(config: &AppConfig, editor: Option<&str>) -> Result<()> {
    let (paths, projects, mut store, launchers) = load_startup(config, editor)?;
    info!(
        editor = paths.editor.as_str(),
        projects = projects.len(),
        launchers = launchers.len(),
        "starting selection"
    );

    let mut session = Session::new(
        projects,
        launchers,
        &mut store,
        paths.executable.clone(),
        config.page_size,
    );
    ui::run(&mut session)?;

    if let Some(summary) = session.state().completed() {
        println!(
            "{} launcher(s) written, {} removed.",
            summary.created, summary.removed
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ProjectListItem {
    label: String,
    folder_id: String,
    folder: String,
    launcher: bool,
}

fn list_projects(config: &AppConfig, editor: Option<&str>, format: OutputFormat) -> Result<()> {
    let (_paths, projects, _store, launchers) = load_startup(config, editor)?;
    let state = SelectionState::new(projects, &launchers, config.page_size);
    let items: Vec<ProjectListItem> = state
        .projects()
        .iter()
        .enumerate()
        .map(|(index, project)| ProjectListItem {
            label: project.label.clone(),
            folder_id: project.folder_id.clone(),
            folder: project.display_folder(),
            launcher: state.is_checked(index),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No recently opened folders.");
            }
            for item in &items {
                let marker = if item.launcher { "x" } else { " " };
                println!("[{marker}] {} ({})", item.label, item.folder);
            }
        }
    }
    Ok(())
}

fn list_launchers(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let launchers = store
        .list()
        .map_err(|err| OpenerError::unavailable("launcher directory", err))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&launchers)?),
        OutputFormat::Text => {
            if launchers.is_empty() {
                println!("No launchers in {}", store.dir().display());
            }
            for launcher in &launchers {
                println!("{}  {}", launcher.label, launcher.backing_path.display());
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PathsOutput {
    editor: Option<String>,
    executable: Option<String>,
    user_data_dir: Option<String>,
    state_db: Option<String>,
    launcher_dir: Option<String>,
    config_dir: String,
    errors: Vec<String>,
}

fn list_paths(config: &AppConfig, editor: Option<&str>, format: OutputFormat) -> Result<()> {
    let mut errors = Vec::new();
    let editor_paths = resolve_editor_paths(config, editor)
        .map_err(|err| errors.push(err.to_string()))
        .ok();
    let launcher_dir = match &config.launcher_dir {
        Some(dir) => Some(dir.clone()),
        None => launcher::default_launcher_dir()
            .map_err(|err| errors.push(err.to_string()))
            .ok(),
    };

    let output = PathsOutput {
        editor: editor_paths
            .as_ref()
            .map(|paths| paths.editor.display_name().to_string()),
        executable: editor_paths
            .as_ref()
            .map(|paths| paths.executable.display().to_string()),
        user_data_dir: editor_paths
            .as_ref()
            .map(|paths| paths.user_data_dir.display().to_string()),
        state_db: editor_paths
            .as_ref()
            .map(|paths| paths.state_db.display().to_string()),
        launcher_dir: launcher_dir.map(|dir| dir.display().to_string()),
        config_dir: config::base_data_dir()?.display().to_string(),
        errors,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
            println!("Editor: {}", show(&output.editor));
            println!("Executable: {}", show(&output.executable));
            println!("User data dir: {}", show(&output.user_data_dir));
            println!("State database: {}", show(&output.state_db));
            println!("Launcher dir: {}", show(&output.launcher_dir));
            println!("Config dir: {}", output.config_dir);
            for error in &output.errors {
                println!("Warning: {error}");
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("Code Opener v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  code-opener <editor>             Pick which recent projects get a launcher");
    println!("  code-opener list [<editor>]      List recent projects and their launcher state");
    println!("  code-opener launchers            List existing launchers");
    println!("  code-opener paths [<editor>]     Show resolved paths");
    println!();
    println!("Editors: vscode (code), vscodium (codium)");
    println!();
    println!("Options:");
    println!("  --format <json|text>             Output format for list commands");
    println!("  --page-size <n>                  Projects per page in the picker");
    println!("  --launcher-dir <path>            Use a different launcher folder");
    println!("  -h, --help                       Show help");
    println!("  -V, --version                    Show version");
    println!();
    println!("Keys: up/down (k/j, tab) move, left/right (h/l, pgup/pgdn) page,");
    println!("      enter/space toggle or confirm, esc/q/ctrl+c quit without changes");
}
