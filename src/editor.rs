use crate::{
    config::EditorOverride,
    error::{OpenerError, Result},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const STATE_DB_RELATIVE: [&str; 3] = ["User", "globalStorage", "state.vscdb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorId {
    VsCode,
    VsCodium,
}

impl EditorId {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "code" | "vscode" => Ok(EditorId::VsCode),
            "codium" | "vscodium" => Ok(EditorId::VsCodium),
            _ => Err(OpenerError::Configuration(format!(
                "unknown editor '{value}' (expected 'vscode' or 'vscodium')"
            ))),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            EditorId::VsCode => "Visual Studio Code",
            EditorId::VsCodium => "VSCodium",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditorId::VsCode => "vscode",
            EditorId::VsCodium => "vscodium",
        }
    }

    fn data_dir_name(self) -> &'static str {
        match self {
            EditorId::VsCode => "Code",
            EditorId::VsCodium => "VSCodium",
        }
    }

    #[cfg_attr(windows, allow(dead_code))]
    fn command_name(self) -> &'static str {
        match self {
            EditorId::VsCode => "code",
            EditorId::VsCodium => "codium",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorPaths {
    pub editor: EditorId,
    pub executable: PathBuf,
    pub user_data_dir: PathBuf,
    pub state_db: PathBuf,
}

pub fn detect_paths(editor: EditorId, overrides: &EditorOverride) -> Result<EditorPaths> {
    let user_data_dir = match &overrides.user_data_dir {
        Some(path) => path.clone(),
        None => default_user_data_dir(editor).ok_or_else(|| {
            OpenerError::unavailable(
                "editor data directory",
                OpenerError::NotFound(format!("{} settings folder", editor.display_name())),
            )
        })?,
    };
    if !user_data_dir.is_dir() {
        return Err(OpenerError::unavailable(
            "editor data directory",
            OpenerError::NotFound(format!("folder {} does not exist", user_data_dir.display())),
        ));
    }

    let state_db = state_db_path(&user_data_dir);
    if !state_db.is_file() {
        return Err(OpenerError::unavailable(
            "editor state database",
            OpenerError::NotFound(format!("file {} does not exist", state_db.display())),
        ));
    }

    let executable = match &overrides.executable {
        Some(path) if path.exists() => path.clone(),
        Some(path) => {
            return Err(OpenerError::unavailable(
                "editor executable",
                OpenerError::NotFound(format!("file {} does not exist", path.display())),
            ))
        }
        None => find_executable(editor).ok_or_else(|| {
            OpenerError::unavailable(
                "editor executable",
                OpenerError::NotFound(format!("{} is not installed", editor.display_name())),
            )
        })?,
    };

    debug!(
        editor = editor.as_str(),
        executable = %executable.display(),
        state_db = %state_db.display(),
        "resolved editor paths"
    );

    Ok(EditorPaths {
        editor,
        executable,
        user_data_dir,
        state_db,
    })
}

pub fn state_db_path(user_data_dir: &Path) -> PathBuf {
    STATE_DB_RELATIVE
        .iter()
        .fold(user_data_dir.to_path_buf(), |path, part| path.join(part))
}

fn default_user_data_dir(editor: EditorId) -> Option<PathBuf> {
    // Roaming AppData on Windows, XDG config on Linux, Application Support on macOS.
    let base = directories::BaseDirs::new()?;
    Some(base.config_dir().join(editor.data_dir_name()))
}

fn find_executable(editor: EditorId) -> Option<PathBuf> {
    executable_candidates(editor)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

#[cfg(windows)]
fn executable_candidates(editor: EditorId) -> Vec<PathBuf> {
    let env_dir = |key: &str| std::env::var_os(key).map(PathBuf::from);
    let mut candidates = Vec::new();
    match editor {
        EditorId::VsCode => {
            if let Some(local) = env_dir("LOCALAPPDATA") {
                candidates.push(local.join("Programs").join("Microsoft VS Code").join("Code.exe"));
            }
            if let Some(program_files) = env_dir("PROGRAMFILES") {
                candidates.push(program_files.join("Microsoft VS Code").join("Code.exe"));
            }
        }
        EditorId::VsCodium => {
            if let Some(program_files) = env_dir("PROGRAMFILES") {
                candidates.push(program_files.join("VSCodium").join("VSCodium.exe"));
            }
            if let Some(local) = env_dir("LOCALAPPDATA") {
                candidates.push(local.join("Programs").join("VSCodium").join("VSCodium.exe"));
            }
        }
    }
    candidates
}

#[cfg(not(windows))]
fn executable_candidates(editor: EditorId) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = match editor {
        EditorId::VsCode => vec![
            PathBuf::from("/usr/bin/code"),
            PathBuf::from("/usr/share/code/bin/code"),
            PathBuf::from("/snap/bin/code"),
            PathBuf::from("/usr/local/bin/code"),
            PathBuf::from("/Applications/Visual Studio Code.app/Contents/Resources/app/bin/code"),
        ],
        EditorId::VsCodium => vec![
            PathBuf::from("/usr/bin/codium"),
            PathBuf::from("/usr/share/codium/bin/codium"),
            PathBuf::from("/snap/bin/codium"),
            PathBuf::from("/usr/local/bin/codium"),
            PathBuf::from("/Applications/VSCodium.app/Contents/Resources/app/bin/codium"),
        ],
    };
    if let Some(path_var) = std::env::var_os("PATH") {
        candidates.extend(std::env::split_paths(&path_var).map(|dir| dir.join(editor.command_name())));
    }
    candidates
}
