use crate::companion::ChatTurn;
use crate::journal::NewEntry;
use crate::journal_entry::{Entry, EXERCISES, MOODS};
use crate::stats::{Achievement, WeeklyStats};
use crate::wellness::{GuidedExercise, QUICK_WORKOUT};
use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::UnicodeWidthChar;

const PREVIEW_WIDTH: usize = 60;
const CURSOR_BLINK: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub enum Action {
    Login,
    Register,
    Logout,
    Write,
    View,
    Search,
    Stats,
    Exercises,
    Chat,
    Export,
    Delete,
    Quit,
}

pub enum ExerciseChoice {
    Guided(GuidedExercise),
    QuickWorkout,
}

pub enum ExportKind {
    Json,
    Report,
}

pub struct Credentials {
    pub username: String,
    pub password: String,
    pub confirm: String,
}

/// Single or multi-line text being edited. `cursor` is a byte offset that
/// always sits on a char boundary.
#[derive(Default)]
struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    fn insert(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    fn backspace(&mut self) {
        if let Some((i, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.value.remove(i);
            self.cursor = i;
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    fn left(&mut self) {
        if let Some((i, _)) = self.value[..self.cursor].char_indices().next_back() {
            self.cursor = i;
        }
    }

    fn right(&mut self) {
        if let Some(c) = self.value[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    fn line_start(&self, pos: usize) -> usize {
        self.value[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn column(&self) -> usize {
        self.value[self.line_start(self.cursor)..self.cursor]
            .chars()
            .count()
    }

    fn move_to_column(&mut self, line_start: usize, column: usize) {
        let line_end = self.value[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(self.value.len());
        let offset = self.value[line_start..line_end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| i)
            .unwrap_or(line_end - line_start);
        self.cursor = line_start + offset;
    }

    fn up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.column();
        let prev_start = self.line_start(start - 1);
        self.move_to_column(prev_start, column);
    }

    fn down(&mut self) {
        if let Some(offset) = self.value[self.cursor..].find('\n') {
            let column = self.column();
            let next_start = self.cursor + offset + 1;
            self.move_to_column(next_start, column);
        }
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    fn handle_key(&mut self, code: KeyCode, multiline: bool) -> bool {
        match code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Up if multiline => self.up(),
            KeyCode::Down if multiline => self.down(),
            KeyCode::Enter if multiline => self.insert('\n'),
            _ => return false,
        }
        true
    }

    fn render(&self, show_cursor: bool, masked: bool) -> String {
        let mut shown = if masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };
        if show_cursor {
            let at = if masked {
                self.value[..self.cursor].chars().count()
            } else {
                self.cursor
            };
            shown.insert(at, '|');
        }
        shown
    }
}

/// Cuts `text` to at most `width` terminal columns.
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            out.push('…');
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

fn mood_style(entry: &Entry) -> Style {
    let color = entry
        .mood_color
        .as_deref()
        .and_then(|c| c.parse::<Color>().ok())
        .unwrap_or(Color::Gray);
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn entry_item(entry: &Entry) -> ListItem<'static> {
    let mood = if entry.mood.is_empty() {
        "-".to_string()
    } else {
        entry.mood.clone()
    };
    ListItem::new(vec![
        Line::from(vec![
            Span::raw(format!("[{}] ", entry.date.display())),
            Span::styled(mood, mood_style(entry)),
            Span::raw(format!(
                "  {}",
                truncate_to_width(entry.journal.lines().next().unwrap_or(""), PREVIEW_WIDTH)
            )),
        ]),
        Line::from(Span::raw(format!("Exercise: {}", entry.exercise))),
    ])
}

fn title(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

fn instructions(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn key_hint(key: &'static str, label: &'static str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {label}  ")),
    ]
}

fn is_press(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
}

pub struct UI {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    fn blink_cursor(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_cursor_update) >= CURSOR_BLINK {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_update = now;
        }
    }

    /// Next key press, or `None` when the poll interval passes without one.
    fn next_key(&self) -> Result<Option<KeyEvent>> {
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if is_press(&key) {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    fn wait_key(&self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()? {
                if is_press(&key) {
                    return Ok(key);
                }
            }
        }
    }

    pub fn display(&mut self, user: Option<&str>, recent: &[Entry], status: &str) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(0),
                        Constraint::Length(1),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            let heading = match user {
                Some(name) => format!("Mood Journal - {name}"),
                None => "Mood Journal".to_string(),
            };
            f.render_widget(title(&heading), chunks[0]);

            let body_title = if user.is_some() {
                "Recent entries"
            } else {
                "Welcome"
            };
            if user.is_some() && !recent.is_empty() {
                let items: Vec<ListItem> = recent.iter().map(entry_item).collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title(body_title));
                f.render_widget(list, chunks[1]);
            } else {
                let text = if user.is_some() {
                    "No entries yet. Press w to write your first one."
                } else {
                    "Log in or create an account to start journaling."
                };
                let welcome = Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL).title(body_title));
                f.render_widget(welcome, chunks[1]);
            }

            let status_line =
                Paragraph::new(status).style(Style::default().fg(Color::Green));
            f.render_widget(status_line, chunks[2]);

            let mut hints = vec![Span::raw("Press ")];
            if user.is_some() {
                for (key, label) in [
                    ("w", "write"),
                    ("v", "view"),
                    ("s", "search"),
                    ("t", "stats"),
                    ("x", "exercises"),
                    ("c", "chat"),
                    ("e", "export"),
                    ("d", "delete account"),
                    ("o", "log out"),
                ] {
                    hints.extend(key_hint(key, label));
                }
            } else {
                hints.extend(key_hint("l", "log in"));
                hints.extend(key_hint("r", "register"));
            }
            hints.extend(key_hint("q", "quit"));
            let controls = Paragraph::new(Line::from(hints))
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            f.render_widget(controls, chunks[3]);
        })?;

        Ok(())
    }

    pub fn handle_input(&self, logged_in: bool) -> Result<Option<Action>> {
        let key = self.wait_key()?;
        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('l') if !logged_in => Some(Action::Login),
            KeyCode::Char('r') if !logged_in => Some(Action::Register),
            KeyCode::Char('o') if logged_in => Some(Action::Logout),
            KeyCode::Char('w') if logged_in => Some(Action::Write),
            KeyCode::Char('v') if logged_in => Some(Action::View),
            KeyCode::Char('s') if logged_in => Some(Action::Search),
            KeyCode::Char('t') if logged_in => Some(Action::Stats),
            KeyCode::Char('x') if logged_in => Some(Action::Exercises),
            KeyCode::Char('c') if logged_in => Some(Action::Chat),
            KeyCode::Char('e') if logged_in => Some(Action::Export),
            KeyCode::Char('d') if logged_in => Some(Action::Delete),
            _ => None,
        };
        Ok(action)
    }

    /// Username/password form. With `confirm` a third field asks for the
    /// password again. Tab or arrows move between fields.
    pub fn prompt_credentials(&mut self, heading: &str, confirm: bool) -> Result<Option<Credentials>> {
        let labels: &[&str] = if confirm {
            &["Username", "Password", "Confirm password"]
        } else {
            &["Username", "Password"]
        };
        let mut fields: Vec<TextInput> = labels.iter().map(|_| TextInput::default()).collect();
        let mut focus = 0;

        loop {
            self.blink_cursor();
            let show_cursor = self.cursor_visible;
            self.terminal.draw(|f| {
                let mut constraints = vec![Constraint::Length(3)];
                constraints.extend(labels.iter().map(|_| Constraint::Length(3)));
                constraints.push(Constraint::Min(0));
                constraints.push(Constraint::Length(3));
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(constraints)
                    .split(f.area());

                f.render_widget(title(heading), chunks[0]);
                for (i, (label, field)) in labels.iter().zip(&fields).enumerate() {
                    let masked = i > 0;
                    let border = if i == focus {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    };
                    let input = Paragraph::new(field.render(i == focus && show_cursor, masked))
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .border_style(border)
                                .title(*label),
                        );
                    f.render_widget(input, chunks[i + 1]);
                }
                f.render_widget(
                    instructions("Tab/Up/Down: Switch field, Enter: Submit, Esc: Cancel"),
                    chunks[labels.len() + 2],
                );
            })?;

            let Some(key) = self.next_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Tab | KeyCode::Down => focus = (focus + 1) % fields.len(),
                KeyCode::BackTab | KeyCode::Up => {
                    focus = (focus + fields.len() - 1) % fields.len()
                }
                KeyCode::Enter if focus + 1 < fields.len() => focus += 1,
                KeyCode::Enter => break,
                code => {
                    fields[focus].handle_key(code, false);
                }
            }
        }

        let mut values = fields.into_iter().map(|f| f.value);
        let username = values.next().unwrap_or_default();
        let password = values.next().unwrap_or_default();
        let repeated = values.next().unwrap_or_else(|| password.clone());
        Ok(Some(Credentials {
            username,
            password,
            confirm: repeated,
        }))
    }

    /// Free text editor. Multi-line editors finish on Esc; single-line ones
    /// submit on Enter and cancel on Esc.
    fn edit_text(&mut self, heading: &str, label: &str, multiline: bool) -> Result<Option<String>> {
        let mut input = TextInput::default();
        let hint = if multiline {
            "Arrows: Move, Enter: New line, Esc: Finish"
        } else {
            "Enter: Submit, Esc: Cancel"
        };

        loop {
            self.blink_cursor();
            let show_cursor = self.cursor_visible;
            self.terminal.draw(|f| {
                let body = if multiline {
                    Constraint::Min(10)
                } else {
                    Constraint::Length(3)
                };
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            body,
                            Constraint::Min(0),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                f.render_widget(title(heading), chunks[0]);
                let editor = Paragraph::new(input.render(show_cursor, false))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(label));
                f.render_widget(editor, chunks[1]);
                f.render_widget(instructions(hint), chunks[3]);
            })?;

            let Some(key) = self.next_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc if multiline => return Ok(Some(input.value)),
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter if !multiline => return Ok(Some(input.value)),
                code => {
                    input.handle_key(code, multiline);
                }
            }
        }
    }

    /// Highlighted list picker; `None` on Esc.
    fn pick(&mut self, heading: &str, options: &[&str]) -> Result<Option<usize>> {
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Min(10),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                f.render_widget(title(heading), chunks[0]);

                let items: Vec<ListItem> = options.iter().map(|o| ListItem::new(*o)).collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    instructions("Up/Down: Navigate, Enter: Select, Esc: Cancel"),
                    chunks[2],
                );
            })?;

            let key = self.wait_key()?;
            match key.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index + 1 < options.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter => return Ok(Some(selected_index)),
                KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }

    pub fn get_new_entry(&mut self) -> Result<Option<NewEntry>> {
        let Some(mood) = self.pick("How are you feeling?", &MOODS)? else {
            return Ok(None);
        };
        let journal = self
            .edit_text("Write about your day", "Journal", true)?
            .unwrap_or_default();
        let exercise = self
            .pick("Exercise done today", &EXERCISES)?
            .map(|i| EXERCISES[i])
            .unwrap_or("None");
        let gratitude = self
            .edit_text("Something you're grateful for (optional)", "Gratitude", false)?
            .unwrap_or_default();

        Ok(Some(NewEntry {
            mood: MOODS[mood].to_string(),
            journal,
            exercise: exercise.to_string(),
            gratitude,
        }))
    }

    pub fn view_entries(&mut self, heading: &str, entries: &[Entry]) -> Result<()> {
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Min(10),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                f.render_widget(title(heading), chunks[0]);

                if entries.is_empty() {
                    let empty = Paragraph::new("No entries found.")
                        .alignment(Alignment::Center)
                        .block(Block::default().borders(Borders::ALL).title("Entries"));
                    f.render_widget(empty, chunks[1]);
                } else {
                    let items: Vec<ListItem> = entries.iter().map(entry_item).collect();
                    let entries_list = List::new(items)
                        .block(Block::default().borders(Borders::ALL).title("Entries"))
                        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                        .highlight_symbol("> ");
                    f.render_stateful_widget(
                        entries_list,
                        chunks[1],
                        &mut ListState::default().with_selected(Some(selected_index)),
                    );
                }

                f.render_widget(
                    instructions("Up/Down: Navigate, Enter: View full entry, Esc: Back"),
                    chunks[2],
                );
            })?;

            let key = self.wait_key()?;
            match key.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index + 1 < entries.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter => {
                    if let Some(entry) = entries.get(selected_index) {
                        self.view_full_entry(entry)?;
                    }
                }
                KeyCode::Esc => break,
                _ => {}
            }
        }

        Ok(())
    }

    fn view_full_entry(&mut self, entry: &Entry) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Length(6),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            f.render_widget(
                title(&format!("Entry from {}", entry.date.display())),
                chunks[0],
            );

            let sentiment = entry
                .sentiment
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            let details = Paragraph::new(vec![
                Line::from(vec![
                    Span::raw("Mood: "),
                    Span::styled(entry.mood.clone(), mood_style(entry)),
                ]),
                Line::from(format!("Exercise: {}", entry.exercise)),
                Line::from(format!(
                    "Grateful for: {}",
                    entry.gratitude.as_deref().unwrap_or("-")
                )),
                Line::from(format!("Sentiment: {sentiment}")),
            ])
            .block(Block::default().borders(Borders::ALL).title("Details"));
            f.render_widget(details, chunks[1]);

            let content = Paragraph::new(entry.journal.clone())
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("Journal"));
            f.render_widget(content, chunks[2]);

            f.render_widget(instructions("Any key: Back"), chunks[3]);
        })?;

        self.wait_key()?;
        Ok(())
    }

    pub fn get_search_query(&mut self) -> Result<Option<String>> {
        Ok(self
            .edit_text("Search Entries", "Search Query", false)?
            .filter(|q| !q.trim().is_empty()))
    }

    pub fn show_stats(
        &mut self,
        stats: &WeeklyStats,
        achievements: &[Achievement],
        affirmation: &str,
        tip: &str,
    ) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(9),
                        Constraint::Length(4),
                        Constraint::Length(4),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            f.render_widget(title("Your Week"), chunks[0]);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
                .split(chunks[1]);

            let sentiment = stats
                .avg_sentiment
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            let summary = Paragraph::new(vec![
                Line::from(format!("Entries (7d):       {}", stats.total_entries)),
                Line::from(format!("Entries (all time): {}", stats.total_all_time)),
                Line::from(format!("Exercises (7d):     {}", stats.exercises_done)),
                Line::from(format!("Avg sentiment (7d): {sentiment}")),
                Line::from(format!("Streak:             {} day(s)", stats.streak_days)),
            ])
            .block(Block::default().borders(Borders::ALL).title("Summary"));
            f.render_widget(summary, columns[0]);

            let widest = stats.mood_distribution.values().copied().max().unwrap_or(1);
            let bars: Vec<ListItem> = stats
                .mood_distribution
                .iter()
                .map(|(mood, count)| {
                    let label = if mood.is_empty() { "(none)" } else { mood.as_str() };
                    let bar = "█".repeat((count * 20).div_ceil(widest));
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:<12} ", truncate_to_width(label, 12))),
                        Span::styled(bar, Style::default().fg(Color::Magenta)),
                        Span::raw(format!(" {count}")),
                    ]))
                })
                .collect();
            let distribution = List::new(bars)
                .block(Block::default().borders(Borders::ALL).title("Mood distribution (7d)"));
            f.render_widget(distribution, columns[1]);

            let earned: Vec<Line> = if achievements.is_empty() {
                vec![Line::from("Write your first entry to earn an achievement.")]
            } else {
                achievements
                    .iter()
                    .map(|a| Line::from(format!("{} {} - {}", a.icon, a.name, a.description)))
                    .collect()
            };
            let earned = Paragraph::new(earned)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Achievements"));
            f.render_widget(earned, chunks[2]);

            let encouragement = Paragraph::new(vec![
                Line::from(Span::styled(
                    affirmation.to_string(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
                Line::from(format!("Tip: {tip}")),
            ])
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("For you"));
            f.render_widget(encouragement, chunks[3]);

            f.render_widget(instructions("Any key: Back"), chunks[4]);
        })?;

        self.wait_key()?;
        Ok(())
    }

    pub fn choose_exercise(&mut self) -> Result<Option<ExerciseChoice>> {
        let mut options: Vec<&str> = GuidedExercise::ALL.iter().map(|e| e.title()).collect();
        options.push("Quick 5-minute workout");

        let choice = self.pick("Exercises", &options)?;
        Ok(choice.map(|i| match GuidedExercise::ALL.get(i) {
            Some(exercise) => ExerciseChoice::Guided(*exercise),
            None => ExerciseChoice::QuickWorkout,
        }))
    }

    /// Shows the guidance text; returns whether to save it as an entry.
    pub fn show_exercise(&mut self, exercise: GuidedExercise, today: NaiveDate) -> Result<bool> {
        let guidance = exercise.guidance(today);
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            f.render_widget(title(exercise.title()), chunks[0]);
            let body = Paragraph::new(guidance.as_str())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(body, chunks[1]);
            f.render_widget(
                instructions("y: Save as exercise entry, any other key: Back"),
                chunks[2],
            );
        })?;

        let key = self.wait_key()?;
        Ok(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')))
    }

    pub fn show_quick_workout(&mut self) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(10),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            f.render_widget(title("Quick 5-minute Workout"), chunks[0]);
            let steps: Vec<ListItem> = QUICK_WORKOUT
                .iter()
                .map(|step| {
                    ListItem::new(vec![
                        Line::from(Span::styled(
                            format!("{} ({})", step.name, step.duration),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(format!("  {}", step.instructions)),
                    ])
                })
                .collect();
            f.render_widget(
                List::new(steps).block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
            f.render_widget(instructions("Any key: Back"), chunks[2]);
        })?;

        self.wait_key()?;
        Ok(())
    }

    /// Renders the transcript with an input line. `None` when the user
    /// leaves the chat.
    pub fn read_chat_message(&mut self, transcript: &[ChatTurn]) -> Result<Option<String>> {
        let mut input = TextInput::default();

        loop {
            self.blink_cursor();
            let show_cursor = self.cursor_visible;
            self.terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Length(3),
                            Constraint::Min(5),
                            Constraint::Length(3),
                            Constraint::Length(3),
                        ]
                        .as_ref(),
                    )
                    .split(f.area());

                f.render_widget(title("Talk to your companion"), chunks[0]);

                let mut lines = Vec::new();
                for turn in transcript {
                    lines.push(Line::from(vec![
                        Span::styled("You: ", Style::default().fg(Color::Cyan)),
                        Span::raw(turn.user.clone()),
                    ]));
                    lines.push(Line::from(vec![
                        Span::styled("Companion: ", Style::default().fg(Color::Green)),
                        Span::raw(turn.bot.clone()),
                    ]));
                }
                let visible = chunks[1].height.saturating_sub(2) as usize;
                let scroll = lines.len().saturating_sub(visible) as u16;
                let history = Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((scroll, 0))
                    .block(Block::default().borders(Borders::ALL).title("Conversation"));
                f.render_widget(history, chunks[1]);

                let message = Paragraph::new(input.render(show_cursor, false))
                    .block(Block::default().borders(Borders::ALL).title("Message"));
                f.render_widget(message, chunks[2]);

                f.render_widget(instructions("Enter: Send, Esc: Back"), chunks[3]);
            })?;

            let Some(key) = self.next_key()? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter => return Ok(Some(input.value)),
                code => {
                    input.handle_key(code, false);
                }
            }
        }
    }

    pub fn choose_export(&mut self) -> Result<Option<ExportKind>> {
        let choice = self.pick("Export", &["JSON data", "Text report"])?;
        Ok(choice.map(|i| if i == 0 { ExportKind::Json } else { ExportKind::Report }))
    }

    pub fn confirm_delete(&mut self) -> Result<bool> {
        let typed = self.edit_text(
            "Type DELETE to permanently delete your account and entries",
            "Confirm",
            false,
        )?;
        Ok(typed.as_deref() == Some("DELETE"))
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TextInput {
        let mut input = TextInput::default();
        for c in text.chars() {
            input.insert(c);
        }
        input
    }

    #[test]
    fn editing_multibyte_text_keeps_char_boundaries() {
        let mut input = typed("café");
        input.left();
        input.backspace();
        assert_eq!(input.value, "caé");
        input.right();
        input.insert('!');
        assert_eq!(input.value, "caé!");
    }

    #[test]
    fn vertical_moves_keep_column() {
        let mut input = typed("first line\nab\nthird line");
        input.up();
        assert_eq!(&input.value[input.line_start(input.cursor)..input.cursor], "ab");
        input.up();
        assert_eq!(input.column(), 2);
        input.down();
        input.down();
        assert_eq!(input.column(), 2);
    }

    #[test]
    fn masked_render_hides_password() {
        let input = typed("hunter2");
        assert_eq!(input.render(false, true), "*******");
        assert_eq!(input.render(true, true), "*******|");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 4), "abcd…");
        assert_eq!(truncate_to_width("日本語", 4), "日本…");
    }
}
