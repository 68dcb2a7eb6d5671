//! Launcher files in the per-user application menu.
//!
//! Each launcher opens the editor on one folder. On Linux and other Unix
//! desktops a launcher is an XDG desktop entry (`<label>.desktop`); on Windows
//! it is a Start Menu shortcut (`<label>.lnk`). Both live in a dedicated
//! `CodeOpener` folder so that listing never picks up unrelated entries.

use crate::error::{OpenerError, Result};
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const LAUNCHER_FOLDER: &str = "CodeOpener";

#[cfg(not(windows))]
pub const LAUNCHER_EXT: &str = "desktop";
#[cfg(windows)]
pub const LAUNCHER_EXT: &str = "lnk";

/// A launcher that already exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Launcher {
    pub label: String,
    pub backing_path: PathBuf,
}

pub trait LauncherStore {
    fn list(&self) -> Result<Vec<Launcher>>;

    /// Replaces any launcher with the same label.
    fn create(&mut self, target: &Path, folder_id: &str, label: &str) -> Result<()>;

    /// Removing a launcher that is already gone succeeds.
    fn remove(&mut self, label: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DirectoryLauncherStore {
    dir: PathBuf,
}

impl DirectoryLauncherStore {
    /// The directory is created on the first `create`, so read-only use
    /// leaves the menu untouched.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn launcher_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.{LAUNCHER_EXT}"))
    }

    // Paths for labels that could leave the directory are refused.
    fn checked_path(&self, label: &str) -> io::Result<PathBuf> {
        if !is_plain_file_name(label) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("launcher label {label:?} is not a plain file name"),
            ));
        }
        Ok(self.launcher_path(label))
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if !self.dir.is_dir() {
            fs::create_dir_all(&self.dir)?;
            info!(dir = %self.dir.display(), "created launcher directory");
        }
        Ok(())
    }
}

impl LauncherStore for DirectoryLauncherStore {
    fn list(&self) -> Result<Vec<Launcher>> {
        let mut launchers = Vec::new();
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "launcher directory does not exist yet");
            return Ok(launchers);
        }
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|err| OpenerError::LauncherAccess {
                path: self.dir.clone(),
                source: err.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(LAUNCHER_EXT)
            {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            launchers.push(Launcher {
                label: label.to_string(),
                backing_path: path.to_path_buf(),
            });
        }
        launchers.sort_by(|a, b| a.label.cmp(&b.label));
        debug!(count = launchers.len(), dir = %self.dir.display(), "listed launchers");
        Ok(launchers)
    }

    fn create(&mut self, target: &Path, folder_id: &str, label: &str) -> Result<()> {
        let create_error = |source| OpenerError::LauncherCreate {
            path: self.launcher_path(label),
            source,
        };
        let path = self.checked_path(label).map_err(create_error)?;
        self.ensure_dir().map_err(create_error)?;
        write_launcher(&path, target, folder_id, label).map_err(create_error)?;
        info!(label, path = %path.display(), "created launcher");
        Ok(())
    }

    fn remove(&mut self, label: &str) -> Result<()> {
        let path = self
            .checked_path(label)
            .map_err(|source| OpenerError::LauncherRemove {
                path: self.launcher_path(label),
                source,
            })?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(label, path = %path.display(), "removed launcher");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(label, "launcher already absent");
                Ok(())
            }
            Err(source) => Err(OpenerError::LauncherRemove { path, source }),
        }
    }
}

fn is_plain_file_name(label: &str) -> bool {
    !label.is_empty() && label != "." && label != ".." && !label.contains(['/', '\\', ':'])
}

pub fn default_launcher_dir() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or_else(|| {
        OpenerError::unavailable(
            "launcher directory",
            OpenerError::NotFound("home directory".to_string()),
        )
    })?;
    platform_menu_dir(&base).map(|menu| menu.join(LAUNCHER_FOLDER))
}

#[cfg(not(windows))]
fn platform_menu_dir(base: &directories::BaseDirs) -> Result<PathBuf> {
    Ok(base.data_dir().join("applications"))
}

#[cfg(windows)]
fn platform_menu_dir(base: &directories::BaseDirs) -> Result<PathBuf> {
    let programs = base
        .config_dir()
        .join("Microsoft")
        .join("Windows")
        .join("Start Menu")
        .join("Programs");
    if !programs.is_dir() {
        return Err(OpenerError::unavailable(
            "launcher directory",
            OpenerError::NotFound(format!("folder {} does not exist", programs.display())),
        ));
    }
    Ok(programs)
}

fn launcher_comment(label: &str) -> String {
    format!("Shortcut for project {label}")
}

#[cfg(not(windows))]
fn write_launcher(path: &Path, target: &Path, folder_id: &str, label: &str) -> io::Result<()> {
    let target_text = target.to_string_lossy();
    let exec = [&*target_text, "--folder-uri", folder_id]
        .iter()
        .map(|arg| quote_exec_arg(arg))
        .collect::<Vec<_>>()
        .join(" ");

    let entry = DesktopEntry::builder()
        .name(label)
        .comment(launcher_comment(label))
        .exec(exec)
        .icon(icon_for_target(target))
        .build();

    let temp = path.with_extension(format!("{LAUNCHER_EXT}.tmp"));
    fs::write(&temp, entry.to_string())?;
    set_executable(&temp)?;
    fs::rename(&temp, path)
}

#[cfg(windows)]
fn write_launcher(path: &Path, target: &Path, folder_id: &str, label: &str) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut link = lnk::ShellLink::new_simple(target).map_err(|err| io::Error::other(err.to_string()))?;
    link.set_arguments(Some(format!("--folder-uri {folder_id}")));
    link.set_name(Some(launcher_comment(label)));
    link.save(path).map_err(|err| io::Error::other(err.to_string()))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(all(not(unix), not(windows)))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(not(windows))]
fn icon_for_target(target: &Path) -> String {
    match target.file_stem().and_then(|stem| stem.to_str()) {
        Some("code") | None => "vscode".to_string(),
        Some("codium") => "vscodium".to_string(),
        Some(stem) => stem.to_string(),
    }
}

// Characters that force an Exec argument into double quotes.
#[cfg(not(windows))]
const EXEC_RESERVED: &[char] = &[
    ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(', ')',
    '`',
];

/// Quotes one argument for a desktop entry `Exec` key. Field codes are
/// disabled by doubling `%`, and backslashes survive both the quoting and the
/// string-value unescaping.
#[cfg(not(windows))]
fn quote_exec_arg(arg: &str) -> String {
    let arg = arg.replace('%', "%%");
    if !arg.is_empty() && !arg.contains(EXEC_RESERVED) {
        return arg;
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for ch in arg.chars() {
        match ch {
            '"' | '`' | '$' => {
                quoted.push('\\');
                quoted.push(ch);
            }
            '\\' => quoted.push_str("\\\\\\\\"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// An XDG desktop entry.
#[cfg(not(windows))]
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    pub name: String,
    pub comment: Option<String>,
    pub exec: String,
    pub icon: String,
    pub terminal: bool,
    pub entry_type: String,
    pub categories: Vec<String>,
    pub startup_notify: bool,
}

#[cfg(not(windows))]
impl Default for DesktopEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            comment: None,
            exec: String::new(),
            icon: String::new(),
            terminal: false,
            entry_type: "Application".to_string(),
            categories: vec!["Development".to_string(), "IDE".to_string()],
            startup_notify: true,
        }
    }
}

#[cfg(not(windows))]
impl DesktopEntry {
    pub fn builder() -> DesktopEntryBuilder {
        DesktopEntryBuilder::default()
    }
}

#[cfg(not(windows))]
impl std::fmt::Display for DesktopEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "[Desktop Entry]")?;
        writeln!(f, "Type={}", self.entry_type)?;
        writeln!(f, "Name={}", self.name)?;
        if let Some(comment) = &self.comment {
            writeln!(f, "Comment={comment}")?;
        }
        writeln!(f, "Exec={}", self.exec)?;
        writeln!(f, "Icon={}", self.icon)?;
        writeln!(f, "Terminal={}", self.terminal)?;
        if !self.categories.is_empty() {
            writeln!(f, "Categories={};", self.categories.join(";"))?;
        }
        writeln!(f, "StartupNotify={}", self.startup_notify)
    }
}

#[cfg(not(windows))]
#[derive(Default)]
pub struct DesktopEntryBuilder {
    entry: DesktopEntry,
}

#[cfg(not(windows))]
impl DesktopEntryBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.entry.name = name.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.entry.comment = Some(comment.into());
        self
    }

    pub fn exec(mut self, exec: impl Into<String>) -> Self {
        self.entry.exec = exec.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.entry.icon = icon.into();
        self
    }

    pub fn build(self) -> DesktopEntry {
        self.entry
    }
}
