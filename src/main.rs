use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{io, sync::Arc, sync::Mutex, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;

use hn_search::{
    config::Cli,
    controller::{Completion, Event, FetchRequest, SearchController},
    fetcher::{spawn_fetch, Fetcher, HttpFetcher},
    sort::SortKey,
    ui::{self, Focus, ScreenState},
};

struct App {
    controller: SearchController,
    screen: ScreenState,
    fetcher: Arc<dyn Fetcher>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl App {
    fn new(fetcher: Arc<dyn Fetcher>, hits_per_page: u32) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            controller: SearchController::new(hits_per_page),
            screen: ScreenState::default(),
            fetcher,
            completions_tx,
            completions_rx,
        }
    }

    fn dispatch(&mut self, event: Event) {
        if let Some(request) = self.controller.handle(event) {
            self.run(request);
        }
        let len = self.controller.view().hits.len();
        self.screen.clamp_selection(len);
    }

    fn run(&self, request: FetchRequest) {
        spawn_fetch(
            Arc::clone(&self.fetcher),
            request,
            self.completions_tx.clone(),
        );
    }

    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.dispatch(Event::Completed(completion));
        }
    }

    fn edit_search_term(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let mut text = self.controller.session().search_term().to_string();
        let mut cursor = self.screen.cursor;
        edit(&mut text, &mut cursor);
        self.screen.cursor = cursor.min(text.chars().count());
        self.dispatch(Event::TextChanged(text));
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli)?;

    let config = cli.search_config();
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client, &config));
    info!(endpoint = %config.endpoint(), query = %config.default_query, "Starting hn-search");

    // Setup Terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create App and run the default query, like a fresh page load
    let mut app = App::new(fetcher, config.hits_per_page);
    app.screen.cursor = config.default_query.chars().count();
    app.dispatch(Event::TextChanged(config.default_query.clone()));
    app.dispatch(Event::Submit);

    // Run Loop
    let res = run_app(&mut terminal, &mut app).await;

    // Outstanding fetches may still land; make sure they are ignored
    app.controller.teardown();

    // Restore Terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}")
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.drain_completions();
        terminal.draw(|f| ui::render(f, &app.controller.view(), &app.screen))?;

        if event::poll(Duration::from_millis(50))? {
            if let TermEvent::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                let quit = match app.screen.focus {
                    Focus::Input => handle_input_key(app, key),
                    Focus::Results => handle_results_key(app, key),
                };
                if quit {
                    return Ok(());
                }
            }
        }
        tokio::task::yield_now().await;
    }
}

/// Returns true when the user asked to quit.
fn handle_input_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Enter => {
            app.screen.selected = 0;
            app.dispatch(Event::Submit);
        }
        KeyCode::Tab => app.screen.focus = Focus::Results,
        KeyCode::Char(c) if ui::is_text_input(&key) => app.edit_search_term(|text, cursor| {
            let at = byte_index(text, *cursor);
            text.insert(at, c);
            *cursor += 1;
        }),
        KeyCode::Backspace => app.edit_search_term(|text, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let at = byte_index(text, *cursor);
                text.remove(at);
            }
        }),
        KeyCode::Delete => app.edit_search_term(|text, cursor| {
            if *cursor < text.chars().count() {
                let at = byte_index(text, *cursor);
                text.remove(at);
            }
        }),
        KeyCode::Left => app.screen.cursor = app.screen.cursor.saturating_sub(1),
        KeyCode::Right => {
            let len = app.controller.session().search_term().chars().count();
            app.screen.cursor = (app.screen.cursor + 1).min(len);
        }
        KeyCode::Home => app.screen.cursor = 0,
        KeyCode::End => {
            app.screen.cursor = app.controller.session().search_term().chars().count();
        }
        _ => {}
    }
    false
}

fn handle_results_key(app: &mut App, key: KeyEvent) -> bool {
    let len = app.controller.view().hits.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return true,
        KeyCode::Tab | KeyCode::Char('/') => app.screen.focus = Focus::Input,
        KeyCode::Up | KeyCode::Char('k') => {
            app.screen.selected = app.screen.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.screen.selected = (app.screen.selected + 1).min(len.saturating_sub(1));
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            let selected = app.screen.selected_id(app.controller.view().hits);
            if let Some(id) = selected {
                app.dispatch(Event::Dismiss(id));
            }
        }
        KeyCode::Char('m') => app.dispatch(Event::LoadMore),
        KeyCode::Char(c @ '0'..='4') => {
            let sort_key = match c {
                '1' => SortKey::Title,
                '2' => SortKey::Author,
                '3' => SortKey::Comments,
                '4' => SortKey::Points,
                _ => SortKey::None,
            };
            app.screen.sort = app.screen.sort.select(sort_key);
        }
        _ => {}
    }
    false
}

fn byte_index(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map_or(text.len(), |(i, _)| i)
}
