//! Turns a confirmed selection into launcher create/remove calls.

use crate::{
    catalog::Project,
    error::{OpenerError, Result},
    launcher::{Launcher, LauncherStore},
    selection::{Command, SelectionState},
};
use serde::Serialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherOp {
    Create { folder_id: String, label: String },
    Remove { label: String },
}

impl LauncherOp {
    pub fn label(&self) -> &str {
        match self {
            LauncherOp::Create { label, .. } | LauncherOp::Remove { label } => label,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            LauncherOp::Create { .. } => "create",
            LauncherOp::Remove { .. } => "remove",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaSummary {
    pub created: usize,
    pub removed: usize,
}

impl DeltaSummary {
    pub fn applied(&self) -> usize {
        self.created + self.removed
    }
}

/// Checked projects are (re)created unconditionally; unchecked projects are
/// removed only when a launcher with the same label existed at startup.
pub fn plan_delta(projects: &[Project], checked: &[bool], launchers: &[Launcher]) -> Vec<LauncherOp> {
    let existing: HashSet<&str> = launchers
        .iter()
        .map(|launcher| launcher.label.as_str())
        .collect();

    projects
        .iter()
        .enumerate()
        .filter_map(|(index, project)| {
            if checked.get(index).copied().unwrap_or(false) {
                Some(LauncherOp::Create {
                    folder_id: project.folder_id.clone(),
                    label: project.label.clone(),
                })
            } else if existing.contains(project.label.as_str()) {
                Some(LauncherOp::Remove {
                    label: project.label.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

/// Applies operations in order and stops at the first failure. Operations that
/// already succeeded are left in place.
pub fn apply_delta<S: LauncherStore + ?Sized>(
    store: &mut S,
    target: &Path,
    ops: &[LauncherOp],
) -> Result<DeltaSummary> {
    let mut summary = DeltaSummary::default();
    for op in ops {
        let outcome = match op {
            LauncherOp::Create { folder_id, label } => store.create(target, folder_id, label),
            LauncherOp::Remove { label } => store.remove(label),
        };
        if let Err(source) = outcome {
            warn!(
                op = op.verb(),
                label = op.label(),
                applied = summary.applied(),
                "launcher update aborted; earlier changes are kept"
            );
            return Err(OpenerError::DeltaApplication {
                op: op.verb(),
                label: op.label().to_string(),
                applied: summary.applied(),
                source: Box::new(source),
            });
        }
        match op {
            LauncherOp::Create { .. } => summary.created += 1,
            LauncherOp::Remove { .. } => summary.removed += 1,
        }
    }
    info!(
        created = summary.created,
        removed = summary.removed,
        "launchers reconciled"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One interactive session: the selection state plus the collaborators the
/// confirm step writes through.
pub struct Session<'a, S: LauncherStore + ?Sized> {
    state: SelectionState,
    launchers: Vec<Launcher>,
    store: &'a mut S,
    target: PathBuf,
}

impl<'a, S: LauncherStore + ?Sized> Session<'a, S> {
    pub fn new(
        projects: Vec<Project>,
        launchers: Vec<Launcher>,
        store: &'a mut S,
        target: PathBuf,
        page_size: usize,
    ) -> Self {
        let state = SelectionState::new(projects, &launchers, page_size);
        Self {
            state,
            launchers,
            store,
            target,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn handle(&mut self, command: Command) -> Result<Flow> {
        if self.state.is_completed() {
            return Ok(match command {
                Command::Cancel | Command::Confirm | Command::Toggle => Flow::Exit,
                _ => Flow::Continue,
            });
        }

        match command {
            Command::Cancel => {
                info!("selection cancelled; no launchers changed");
                return Ok(Flow::Exit);
            }
            Command::MoveNext => self.state.move_next(),
            Command::MovePrevious => self.state.move_previous(),
            Command::NextPage => self.state.next_page(),
            Command::PreviousPage => self.state.previous_page(),
            Command::Toggle if !self.state.on_confirm() => self.state.toggle(),
            Command::Confirm if self.state.on_confirm() => self.confirm()?,
            Command::Toggle | Command::Confirm => {}
        }
        Ok(Flow::Continue)
    }

    fn confirm(&mut self) -> Result<()> {
        let ops = plan_delta(self.state.projects(), self.state.checked(), &self.launchers);
        let summary = apply_delta(&mut *self.store, &self.target, &ops)?;
        self.state.complete(summary);
        Ok(())
    }
}
