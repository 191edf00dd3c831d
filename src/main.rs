use std::{
    env, io,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use notewise::clipboard::{DataTransfer, DataUrlEncoder, insert_data};
use notewise::config::Config;
use notewise::dictionary::{Dictionary, word_at};
use notewise::editor::{BlockKind, Editor};
use notewise::render::{RenderResult, render_document};
use notewise::shortcuts::ShortcutDispatcher;
use notewise::storage::{
    DirRemote, DirStore, SaveScheduler, cache_document, load_document, save_document,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    run()
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(note_path) = args.next() else {
        eprintln!("Usage: notewise <folder/note>");
        return Ok(());
    };

    let config = Config::load().context("failed to load configuration")?;
    let mut cache = DirStore::new(&config.cache_dir);
    let remote = DirRemote::new(&config.notes_dir);
    let document = load_document(&mut cache, &remote, &note_path)
        .with_context(|| format!("failed to load {note_path}"))?;
    let dictionary = Dictionary::load(DirStore::new(&config.cache_dir), &config.common_words)
        .context("failed to load dictionary")?;

    let mut app = App::new(
        Editor::new(document),
        note_path,
        &config,
        cache,
        remote,
        dictionary,
    );

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    app.flush();
    Ok(())
}

struct App {
    editor: Editor,
    dispatcher: ShortcutDispatcher,
    note_path: String,
    cache: DirStore,
    remote: DirRemote,
    dictionary: Dictionary<DirStore>,
    scheduler: SaveScheduler,
    scroll_top: usize,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
    definition_prompt: Option<DefinitionPrompt>,
}

/// Definition being typed for the word under the caret.
struct DefinitionPrompt {
    word: String,
    input: String,
}

impl App {
    fn new(
        editor: Editor,
        note_path: String,
        config: &Config,
        cache: DirStore,
        remote: DirRemote,
        dictionary: Dictionary<DirStore>,
    ) -> Self {
        Self {
            editor,
            dispatcher: ShortcutDispatcher::new(config.indent_text.clone()),
            note_path,
            cache,
            remote,
            dictionary,
            scheduler: SaveScheduler::new(config.save_interval()),
            scroll_top: 0,
            should_quit: false,
            status_message: None,
            definition_prompt: None,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let editor_area = vertical[0];
        let status_area = vertical[1];

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(editor_area);
        let text_area = horizontal[0];
        let scrollbar_area = horizontal[1];

        let dictionary = &self.dictionary;
        let highlight = |text: &str| dictionary.undefined_ranges(text);
        let focus = self.editor.selection().map(|selection| &selection.focus);
        let render = render_document(
            self.editor.document(),
            focus,
            text_area.width.max(1) as usize,
            Some(&highlight),
        );

        let viewport_height = text_area.height as usize;
        self.adjust_scroll(&render, viewport_height);

        let paragraph = Paragraph::new(Text::from(render.lines.clone()))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        let mut scrollbar_state = ScrollbarState::new(render.total_lines).position(self.scroll_top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight);
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);

        if let Some(cursor) = render.cursor {
            if cursor.line >= self.scroll_top && cursor.line < self.scroll_top + viewport_height {
                let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
                let cursor_x = text_area.x + cursor.column.min(text_area.width.saturating_sub(1));
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }

        let status_text = self.status_line();
        let status_widget = Paragraph::new(Line::from(Span::styled(status_text, Style::default())))
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status_widget, status_area);
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if let Some(cursor) = &render.cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = (cursor.line + 1).saturating_sub(viewport);
            }
        }
        self.scroll_top = self.scroll_top.min(max_scroll);
    }

    fn status_line(&mut self) -> String {
        self.prune_status_message();
        let breadcrumbs = self
            .editor
            .focus_ancestor_kinds()
            .iter()
            .map(|kind| kind.label())
            .collect::<Vec<_>>()
            .join(" > ");
        if let Some(prompt) = &self.definition_prompt {
            let missing = self.dictionary.undefined_words(&prompt.input);
            let needs = if missing.is_empty() {
                String::new()
            } else {
                format!(" | define next: {}", missing.join(", "))
            };
            return format!(
                "Define {}: {}{needs} | Enter save | Esc cancel",
                prompt.word, prompt.input
            );
        }
        if let Some((message, _)) = &self.status_message {
            return format!("{breadcrumbs} | {message}");
        }
        if let Some((word, definition)) = self.word_under_caret().and_then(|word| {
            let definition = self.dictionary.definition(&word)?.to_string();
            Some((word, definition))
        }) {
            return format!("{breadcrumbs} | {word}: {definition}");
        }

        let marker = if self.scheduler.is_pending() { "*" } else { "" };
        format!(
            "{breadcrumbs} | {}{marker} | Ctrl-D define | Ctrl-S save | Ctrl-Q quit",
            self.note_path
        )
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(
                key @ KeyEvent {
                    kind: KeyEventKind::Press,
                    ..
                },
            ) => self.handle_key(key),
            Event::Paste(text) => {
                let data = DataTransfer::html(text);
                if insert_data(&mut self.editor, &data, &DataUrlEncoder) {
                    self.mark_changed();
                }
            }
            _ => {}
        }
    }

    fn word_under_caret(&self) -> Option<String> {
        let offset = self.editor.selection()?.focus.offset;
        word_at(self.editor.focus_text()?, offset).map(str::to_string)
    }

    fn start_definition(&mut self) {
        let Some(word) = self.word_under_caret() else {
            self.set_status("No word under the caret");
            return;
        };
        if self.dictionary.is_common(&word) {
            self.set_status(format!("{word} is a common word"));
            return;
        }
        let input = self.dictionary.definition(&word).unwrap_or_default().to_string();
        self.definition_prompt = Some(DefinitionPrompt { word, input });
    }

    fn handle_definition_key(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => self.definition_prompt = None,
            (KeyCode::Enter, _) => {
                let Some(prompt) = self.definition_prompt.take() else {
                    return;
                };
                match self.dictionary.define(&prompt.word, prompt.input.trim()) {
                    Ok(()) => self.set_status(format!("Defined {}", prompt.word)),
                    Err(err) => {
                        tracing::warn!("failed to store definition: {err}");
                        self.set_status(format!("Definition not saved: {err}"));
                    }
                }
            }
            (KeyCode::Backspace, _) => {
                if let Some(prompt) = &mut self.definition_prompt {
                    prompt.input.pop();
                }
            }
            (KeyCode::Char(ch), m) if !m.contains(KeyModifiers::CONTROL) => {
                if let Some(prompt) = &mut self.definition_prompt {
                    prompt.input.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.definition_prompt.is_some() {
            self.handle_definition_key(key);
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.save();
                return;
            }
            (KeyCode::Char('d'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.start_definition();
                return;
            }
            (KeyCode::Char('t'), m) if m.contains(KeyModifiers::CONTROL) => {
                if self.editor.insert_table() {
                    self.mark_changed();
                }
                return;
            }
            (KeyCode::Char('r'), m) if m.contains(KeyModifiers::CONTROL) => {
                if let Some((row, _)) = self.editor.selected_table_pos() {
                    if self.editor.insert_table_row(row) {
                        self.mark_changed();
                    }
                }
                return;
            }
            (KeyCode::Char('l'), m) if m.contains(KeyModifiers::CONTROL) => {
                if let Some((_, col)) = self.editor.selected_table_pos() {
                    if self.editor.insert_table_col(col + 1) {
                        self.mark_changed();
                    }
                }
                return;
            }
            (KeyCode::Char('o'), m) if m.contains(KeyModifiers::CONTROL) => {
                if self.editor.toggle_block(BlockKind::OrderedList) {
                    self.mark_changed();
                }
                return;
            }
            (KeyCode::Char('k'), m) if m.contains(KeyModifiers::CONTROL) => {
                if self.editor.toggle_block(BlockKind::UnorderedList) {
                    self.mark_changed();
                }
                return;
            }
            _ => {}
        }

        if self.dispatcher.handle_key(&mut self.editor, &key) {
            self.mark_changed();
            return;
        }

        let changed = match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.editor.insert_break(),
            (KeyCode::Backspace, _) => self.editor.delete_backward(),
            (KeyCode::Left, _) => {
                self.editor.move_left();
                false
            }
            (KeyCode::Right, _) => {
                self.editor.move_right();
                false
            }
            (KeyCode::Up, _) => {
                self.editor.move_up();
                false
            }
            (KeyCode::Down, _) => {
                self.editor.move_down();
                false
            }
            (KeyCode::Home, m) if m.contains(KeyModifiers::CONTROL) => {
                self.editor.move_to_start();
                false
            }
            (KeyCode::End, m) if m.contains(KeyModifiers::CONTROL) => {
                self.editor.move_to_end();
                false
            }
            (KeyCode::Char(ch), m)
                if !m.contains(KeyModifiers::CONTROL) && !m.contains(KeyModifiers::ALT) =>
            {
                self.editor.insert_text(ch.encode_utf8(&mut [0; 4]))
            }
            _ => false,
        };
        if changed {
            self.mark_changed();
        }
    }

    /// Cache every change locally right away; the remote push waits for the
    /// editor to go idle.
    fn mark_changed(&mut self) {
        if let Err(err) = cache_document(&mut self.cache, &self.note_path, self.editor.document()) {
            tracing::warn!("failed to cache note: {err}");
            self.set_status(format!("Cache error: {err}"));
        }
        self.scheduler.mark_changed(Instant::now());
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
        if self.scheduler.due(Instant::now()) {
            self.save();
        }
    }

    fn save(&mut self) {
        match save_document(&mut self.remote, &self.note_path, self.editor.document()) {
            Ok(()) => {
                self.scheduler.mark_saved();
                self.set_status("Saved");
            }
            Err(err) => {
                tracing::warn!("failed to save note: {err}");
                self.set_status(format!("Save failed: {err}"));
                self.scheduler.mark_changed(Instant::now());
            }
        }
    }

    fn flush(&mut self) {
        if self.scheduler.is_pending() {
            self.save();
        }
    }
}
