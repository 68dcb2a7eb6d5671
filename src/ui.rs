use crate::{
    launcher::LauncherStore,
    reconcile::{DeltaSummary, Flow, Session},
    selection::{Command, SelectionState},
};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
};
use std::io;

const TITLE: &str = "Code Opener";

#[derive(Clone)]
pub struct Theme {
    accent: Color,
    accent_soft: Color,
    border: Color,
    text: Color,
    muted: Color,
    success: Color,
    checked: Color,
    inactive_dot: Color,
}

impl Theme {
    pub fn new() -> Self {
        Self {
            accent: Color::Rgb(120, 190, 255),
            accent_soft: Color::Rgb(70, 110, 160),
            border: Color::Rgb(65, 75, 90),
            text: Color::Rgb(220, 230, 240),
            muted: Color::Rgb(135, 145, 155),
            success: Color::Rgb(120, 220, 140),
            checked: Color::Rgb(230, 200, 120),
            inactive_dot: Color::Rgb(70, 75, 85),
        }
    }

    fn panel(&self, title: &'static str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border))
            .title(Span::styled(
                title,
                Style::default()
                    .fg(self.accent)
                    .add_modifier(Modifier::BOLD),
            ))
            .padding(Padding {
                left: 1,
                right: 1,
                top: 1,
                bottom: 0,
            })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run<S: LauncherStore + ?Sized>(session: &mut Session<'_, S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: LauncherStore + ?Sized>(
    terminal: &mut Terminal<impl Backend>,
    session: &mut Session<'_, S>,
) -> Result<()> {
    let theme = Theme::new();
    loop {
        terminal.draw(|frame| draw(frame, session.state(), &theme))?;

        // Blocks until the next key; there is nothing to refresh in between.
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(command) = command_for_key(session.state(), key) else {
            continue;
        };
        if session.handle(command)? == Flow::Exit {
            break;
        }
    }

    Ok(())
}

pub fn command_for_key(state: &SelectionState, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Cancel),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Cancel),
        KeyCode::Up | KeyCode::BackTab | KeyCode::Char('k') | KeyCode::Char('K') => {
            Some(Command::MovePrevious)
        }
        KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') | KeyCode::Char('J') => {
            Some(Command::MoveNext)
        }
        KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') | KeyCode::Char('H') => {
            Some(Command::PreviousPage)
        }
        KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') | KeyCode::Char('L') => {
            Some(Command::NextPage)
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(state.activation()),
        _ => None,
    }
}

fn draw(frame: &mut Frame<'_>, state: &SelectionState, theme: &Theme) {
    let area = frame.size();
    let lines = match state.completed() {
        Some(summary) => completion_lines(summary, theme),
        None => selection_lines(state, theme),
    };
    let widget = Paragraph::new(lines)
        .block(theme.panel(TITLE))
        .style(Style::default().fg(theme.text));
    frame.render_widget(widget, area);
}

/// The current page, its indicator and the confirm button.
pub fn selection_lines(state: &SelectionState, theme: &Theme) -> Vec<Line<'static>> {
    let muted = Style::default().fg(theme.muted);
    let mut lines = vec![
        Line::from(Span::styled(
            "Select the projects that should get a launcher.",
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            "Entries that are left unchecked will be removed.",
            muted.add_modifier(Modifier::DIM),
        )),
        Line::from(""),
    ];

    if state.projects().is_empty() {
        lines.push(Line::from(Span::styled("No recently opened folders.", muted)));
    }

    for index in state.page_bounds() {
        let project = &state.projects()[index];
        let on_cursor = state.cursor() == index;
        let cursor = if on_cursor { ">" } else { " " };
        let (marker, marker_style) = if state.is_checked(index) {
            ("x", Style::default().fg(theme.checked))
        } else {
            (" ", muted)
        };
        let label_style = if on_cursor {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{cursor} ["), muted),
            Span::styled(marker, marker_style),
            Span::styled("] ", muted),
            Span::styled(project.label.clone(), label_style),
            Span::styled(format!(" ({})", project.display_folder()), muted),
        ]));
    }

    lines.push(page_indicator(state, theme));
    lines.push(Line::from(""));
    lines.push(confirm_button(state.on_confirm(), theme));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "↑/↓ move  ←/→ page  enter/space toggle  esc quit",
        muted,
    )));
    lines
}

fn page_indicator(state: &SelectionState, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for page in 0..state.page_count() {
        let color = if page == state.page() {
            theme.text
        } else {
            theme.inactive_dot
        };
        spans.push(Span::styled("•", Style::default().fg(color)));
    }
    spans.push(Span::styled(
        format!("  {}/{}", state.page() + 1, state.page_count()),
        Style::default().fg(theme.muted),
    ));
    Line::from(spans)
}

fn confirm_button(selected: bool, theme: &Theme) -> Line<'static> {
    let (text, style) = if selected {
        (
            "> Confirm <",
            Style::default()
                .fg(Color::Black)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("Confirm", Style::default().fg(theme.accent_soft))
    };
    Line::from(vec![Span::raw("  "), Span::styled(format!(" {text} "), style)])
}

pub fn completion_lines(summary: &DeltaSummary, theme: &Theme) -> Vec<Line<'static>> {
    let success = Style::default().fg(theme.success);
    vec![
        Line::from(Span::styled(
            "Completed successfully!",
            success.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} launcher(s) written, {} removed.",
                summary.created, summary.removed
            ),
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled("Press escape (or ctrl+c) to exit!", success)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Project, launcher::Launcher};
    use std::path::PathBuf;

    fn state(count: usize, page_size: usize) -> SelectionState {
        let projects = (0..count)
            .map(|index| Project::from_folder_id(format!("file:///work/my%20p{index}")))
            .collect();
        let launchers = vec![Launcher {
            label: "my p1".to_string(),
            backing_path: PathBuf::from("/menu/my p1.desktop"),
        }];
        SelectionState::new(projects, &launchers, page_size)
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_commands() {
        let state = state(3, 10);
        assert_eq!(command_for_key(&state, key(KeyCode::Up)), Some(Command::MovePrevious));
        assert_eq!(command_for_key(&state, key(KeyCode::BackTab)), Some(Command::MovePrevious));
        assert_eq!(command_for_key(&state, key(KeyCode::Char('j'))), Some(Command::MoveNext));
        assert_eq!(command_for_key(&state, key(KeyCode::Tab)), Some(Command::MoveNext));
        assert_eq!(command_for_key(&state, key(KeyCode::PageUp)), Some(Command::PreviousPage));
        assert_eq!(command_for_key(&state, key(KeyCode::Char('l'))), Some(Command::NextPage));
        assert_eq!(command_for_key(&state, key(KeyCode::Char(' '))), Some(Command::Toggle));
        assert_eq!(command_for_key(&state, key(KeyCode::Esc)), Some(Command::Cancel));
        assert_eq!(command_for_key(&state, key(KeyCode::Char('x'))), None);
        assert_eq!(
            command_for_key(&state, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Cancel)
        );
    }

    #[test]
    fn enter_on_confirm_item_confirms() {
        let mut state = state(3, 10);
        state.move_previous();
        assert_eq!(command_for_key(&state, key(KeyCode::Enter)), Some(Command::Confirm));
    }

    #[test]
    fn renders_only_the_visible_page() {
        let mut state = state(7, 3);
        state.next_page();
        let rendered: Vec<String> = selection_lines(&state, &Theme::new()).iter().map(text).collect();

        assert!(rendered.iter().any(|line| line == "> [ ] my p3 (/work/my p3)"));
        assert!(rendered.iter().any(|line| line == "  [ ] my p4 (/work/my p4)"));
        assert!(rendered.iter().any(|line| line == "  [ ] my p5 (/work/my p5)"));
        assert!(!rendered.iter().any(|line| line.contains("my p1")));
        assert!(!rendered.iter().any(|line| line.contains("my p6")));
        assert!(rendered.iter().any(|line| line == "  •••  2/3"));
        assert!(rendered.iter().any(|line| line == "   Confirm "));
    }

    #[test]
    fn checked_items_and_confirm_focus_are_marked() {
        let mut state = state(3, 10);
        state.move_previous();
        let rendered: Vec<String> = selection_lines(&state, &Theme::new()).iter().map(text).collect();

        assert!(rendered.iter().any(|line| line == "  [x] my p1 (/work/my p1)"));
        assert!(rendered.iter().any(|line| line == "   > Confirm < "));
    }

    #[test]
    fn completion_screen_has_no_list() {
        let summary = DeltaSummary {
            created: 2,
            removed: 1,
        };
        let rendered: Vec<String> = completion_lines(&summary, &Theme::new()).iter().map(text).collect();
        assert_eq!(rendered[0], "Completed successfully!");
        assert_eq!(rendered[1], "2 launcher(s) written, 1 removed.");
        assert!(!rendered.iter().any(|line| line.contains("Confirm")));
    }
}
