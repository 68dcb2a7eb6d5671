//! Interactive selection over the recent-projects catalog.
//!
//! The cursor ranges over `0..=N` where `N` is the confirm pseudo-item.
//! Navigation is a ring over the visible page plus the confirm item, so the
//! cursor never leaves the page it is on unless the page itself changes.

use crate::{catalog::Project, launcher::Launcher, reconcile::DeltaSummary};
use std::{collections::HashSet, ops::Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MovePrevious,
    MoveNext,
    PreviousPage,
    NextPage,
    Toggle,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct SelectionState {
    projects: Vec<Project>,
    checked: Vec<bool>,
    cursor: usize,
    // Kept alongside the cursor because the confirm item is reachable from
    // every page; while the cursor is on an item, `page == cursor / page_size`.
    page: usize,
    page_size: usize,
    completed: Option<DeltaSummary>,
}

impl SelectionState {
    /// Pre-checks every project whose label already has a launcher.
    pub fn new(projects: Vec<Project>, launchers: &[Launcher], page_size: usize) -> Self {
        let existing: HashSet<&str> = launchers
            .iter()
            .map(|launcher| launcher.label.as_str())
            .collect();
        let checked = projects
            .iter()
            .map(|project| existing.contains(project.label.as_str()))
            .collect();
        Self {
            projects,
            checked,
            cursor: 0,
            page: 0,
            page_size: page_size.max(1),
            completed: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn checked(&self) -> &[bool] {
        &self.checked
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn confirm_index(&self) -> usize {
        self.projects.len()
    }

    pub fn on_confirm(&self) -> bool {
        self.cursor == self.confirm_index()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.projects.len().div_ceil(self.page_size).max(1)
    }

    /// Project indices visible on the current page.
    pub fn page_bounds(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.projects.len());
        let end = (start + self.page_size).min(self.projects.len());
        start..end
    }

    pub fn completed(&self) -> Option<&DeltaSummary> {
        self.completed.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Enter and space act on whatever the cursor is over.
    pub fn activation(&self) -> Command {
        if self.on_confirm() {
            Command::Confirm
        } else {
            Command::Toggle
        }
    }

    pub fn move_next(&mut self) {
        if self.is_completed() {
            return;
        }
        let bounds = self.page_bounds();
        self.cursor = if bounds.is_empty() {
            self.confirm_index()
        } else if self.on_confirm() {
            bounds.start
        } else if self.cursor + 1 >= bounds.end {
            self.confirm_index()
        } else {
            self.cursor + 1
        };
    }

    pub fn move_previous(&mut self) {
        if self.is_completed() {
            return;
        }
        let bounds = self.page_bounds();
        self.cursor = if bounds.is_empty() {
            self.confirm_index()
        } else if self.on_confirm() {
            bounds.end - 1
        } else if self.cursor <= bounds.start {
            self.confirm_index()
        } else {
            self.cursor - 1
        };
    }

    pub fn previous_page(&mut self) {
        if self.is_completed() {
            return;
        }
        self.page = self.page.saturating_sub(1);
        self.reset_cursor_to_page();
    }

    pub fn next_page(&mut self) {
        if self.is_completed() {
            return;
        }
        if self.page + 1 < self.page_count() {
            self.page += 1;
        }
        self.reset_cursor_to_page();
    }

    pub fn toggle(&mut self) {
        if self.is_completed() {
            return;
        }
        if let Some(checked) = self.checked.get_mut(self.cursor) {
            *checked = !*checked;
        }
    }

    pub fn complete(&mut self, summary: DeltaSummary) {
        self.completed = Some(summary);
    }

    fn reset_cursor_to_page(&mut self) {
        let bounds = self.page_bounds();
        self.cursor = if bounds.is_empty() {
            self.confirm_index()
        } else {
            bounds.start
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn projects(count: usize) -> Vec<Project> {
        (0..count)
            .map(|index| Project::from_folder_id(format!("file:///work/p{index}")))
            .collect()
    }

    fn launcher(label: &str) -> Launcher {
        Launcher {
            label: label.to_string(),
            backing_path: PathBuf::from(format!("/menu/{label}.desktop")),
        }
    }

    #[test]
    fn init_checks_exact_label_matches_only() {
        let projects = vec![
            Project::from_folder_id("file:///a"),
            Project::from_folder_id("file:///B"),
            Project::from_folder_id("file:///c"),
        ];
        let launchers = vec![launcher("a"), launcher("b"), launcher("zzz")];
        let state = SelectionState::new(projects, &launchers, 10);
        assert_eq!(state.checked(), &[true, false, false]);
        assert_eq!(state.cursor(), 0);
        assert!(!state.is_completed());
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let state = SelectionState::new(projects(3), &[], 0);
        assert_eq!(state.page_count(), 3);
        assert_eq!(state.page_bounds(), 0..1);
    }

    #[test]
    fn empty_catalog_starts_on_confirm() {
        let mut state = SelectionState::new(Vec::new(), &[], 10);
        assert!(state.on_confirm());
        assert_eq!(state.page_count(), 1);
        for command in [
            Command::MoveNext,
            Command::MovePrevious,
            Command::NextPage,
            Command::PreviousPage,
        ] {
            apply_navigation(&mut state, command);
            assert_eq!(state.cursor(), 0);
        }
        assert_eq!(state.activation(), Command::Confirm);
    }

    #[test]
    fn move_next_cycles_through_page_then_confirm() {
        let mut state = SelectionState::new(projects(3), &[], 10);
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(state.cursor());
            state.move_next();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn move_previous_wraps_from_first_item_to_confirm() {
        let mut state = SelectionState::new(projects(3), &[], 10);
        state.move_previous();
        assert!(state.on_confirm());
        state.move_previous();
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn ring_is_page_aware() {
        let mut state = SelectionState::new(projects(25), &[], 10);
        state.next_page();
        assert_eq!(state.page(), 1);
        assert_eq!(state.cursor(), 10);

        state.move_previous();
        assert!(state.on_confirm());
        state.move_previous();
        assert_eq!(state.cursor(), 19);
        state.move_next();
        assert!(state.on_confirm());
        state.move_next();
        assert_eq!(state.cursor(), 10);

        state.next_page();
        assert_eq!(state.page(), 2);
        assert_eq!(state.page_bounds(), 20..25);
        state.move_previous();
        state.move_previous();
        assert_eq!(state.cursor(), 24);
    }

    #[test]
    fn page_jumps_clamp_at_both_ends() {
        let mut state = SelectionState::new(projects(12), &[], 5);
        state.move_next();
        state.previous_page();
        assert_eq!(state.page(), 0);
        assert_eq!(state.cursor(), 0);

        state.next_page();
        state.next_page();
        state.next_page();
        assert_eq!(state.page(), 2);
        assert_eq!(state.cursor(), 10);

        state.move_previous();
        assert!(state.on_confirm());
        state.previous_page();
        assert_eq!(state.page(), 1);
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn page_jumps_keep_checked_state() {
        let mut state = SelectionState::new(projects(12), &[], 5);
        state.toggle();
        state.next_page();
        state.toggle();
        state.previous_page();
        assert!(state.is_checked(0));
        assert!(state.is_checked(5));
        assert_eq!(state.checked().iter().filter(|c| **c).count(), 2);
    }

    #[test]
    fn cursor_stays_in_range_for_every_page_size() {
        let commands = [
            Command::MoveNext,
            Command::MoveNext,
            Command::NextPage,
            Command::MovePrevious,
            Command::MovePrevious,
            Command::MovePrevious,
            Command::NextPage,
            Command::MoveNext,
            Command::PreviousPage,
            Command::MovePrevious,
            Command::NextPage,
            Command::NextPage,
            Command::NextPage,
            Command::MoveNext,
            Command::MoveNext,
        ];
        for count in 0..14 {
            for page_size in 1..8 {
                let mut state = SelectionState::new(projects(count), &[], page_size);
                for command in commands {
                    apply_navigation(&mut state, command);
                    assert!(state.cursor() <= count);
                    assert!(state.page() < state.page_count());
                    if !state.on_confirm() {
                        assert!(state.page_bounds().contains(&state.cursor()));
                    }
                }
            }
        }
    }

    #[test]
    fn wrap_holds_on_every_page() {
        for count in 1..12 {
            for page_size in 1..6 {
                let mut state = SelectionState::new(projects(count), &[], page_size);
                for page in 0..state.page_count() {
                    let bounds = state.page_bounds();
                    assert_eq!(state.page(), page);
                    assert_eq!(state.cursor(), bounds.start);

                    for _ in 0..bounds.len() {
                        state.move_next();
                    }
                    assert!(state.on_confirm());
                    state.move_next();
                    assert_eq!(state.cursor(), bounds.start);

                    state.move_previous();
                    assert!(state.on_confirm());
                    state.move_previous();
                    assert_eq!(state.cursor(), bounds.end - 1);

                    state.next_page();
                }
            }
        }
    }

    #[test]
    fn double_toggle_restores_state() {
        let mut state = SelectionState::new(projects(4), &[launcher("p2")], 10);
        state.move_next();
        state.move_next();
        let before = state.checked().to_vec();
        state.toggle();
        assert_ne!(state.checked(), before.as_slice());
        state.toggle();
        assert_eq!(state.checked(), before.as_slice());
        assert_eq!(state.cursor(), 2);
        assert_eq!(state.page(), 0);
    }

    #[test]
    fn activation_depends_on_cursor() {
        let mut state = SelectionState::new(projects(2), &[], 10);
        assert_eq!(state.activation(), Command::Toggle);
        state.move_previous();
        assert_eq!(state.activation(), Command::Confirm);
    }

    #[test]
    fn completed_state_ignores_mutation() {
        let mut state = SelectionState::new(projects(3), &[], 10);
        state.complete(DeltaSummary::default());
        let cursor = state.cursor();
        state.move_next();
        state.next_page();
        state.toggle();
        assert_eq!(state.cursor(), cursor);
        assert_eq!(state.checked(), &[false, false, false]);
    }

    fn apply_navigation(state: &mut SelectionState, command: Command) {
        match command {
            Command::MoveNext => state.move_next(),
            Command::MovePrevious => state.move_previous(),
            Command::NextPage => state.next_page(),
            Command::PreviousPage => state.previous_page(),
            _ => {}
        }
    }
}
