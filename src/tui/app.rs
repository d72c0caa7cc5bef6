use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, info, warn};

use crate::editor::{Editor, Effect, Key};
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::watcher::DayWatcher;
use crate::io::{DataPaths, StoreError};
use crate::model::DaySchedule;
use crate::session::Session;
use crate::sync::client::HttpStore;
use crate::sync::outbox::{Abandoned, FailOutcome};
use crate::sync::worker::{SyncReport, SyncRequest, SyncWorker};

use super::keymap;
use super::render;
use super::theme::Theme;

/// What the header says about the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// No endpoint or user configured; changes stay queued
    LocalOnly { queued: usize },
    Synced,
    Pending { queued: usize },
    /// The head entry failed and is waiting for its next attempt
    Retrying { queued: usize, error: String },
}

pub struct App {
    pub editor: Editor,
    pub session: Session,
    pub theme: Theme,
    pub should_quit: bool,
    worker: Option<SyncWorker>,
    watcher: Option<DayWatcher>,
    /// Last send error, cleared by the next success
    last_error: Option<String>,
    /// The open day changed on disk while the editor was busy
    reload_pending: bool,
    /// Fresh copy from the backend held back while the editor was busy
    deferred_day: Option<DaySchedule>,
}

impl App {
    pub fn new(session: Session, date: NaiveDate) -> Result<Self, StoreError> {
        let schedule = session.load_day(date)?;
        let inventory = session.load_inventory()?;
        let editor = Editor::new(schedule)
            .with_inventory(inventory)
            .with_settings(session.editor_settings())
            .with_quick_commands(session.quick_commands());
        let theme = Theme::from_config(&session.config.ui);
        Ok(App {
            editor,
            session,
            theme,
            should_quit: false,
            worker: None,
            watcher: None,
            last_error: None,
            reload_pending: false,
            deferred_day: None,
        })
    }

    /// Start sending the journal and ask for fresh data.
    pub fn attach_worker(&mut self, worker: SyncWorker) {
        self.worker = Some(worker);
        self.request_refresh();
        self.pump();
    }

    pub fn attach_watcher(&mut self, watcher: DayWatcher) {
        self.watcher = Some(watcher);
    }

    pub fn sync_state(&self) -> SyncState {
        let queued = self.session.outbox.len();
        if self.worker.is_none() {
            return SyncState::LocalOnly { queued };
        }
        match (&self.last_error, queued) {
            (_, 0) => SyncState::Synced,
            (Some(error), _) => SyncState::Retrying {
                queued,
                error: error.clone(),
            },
            (None, _) => SyncState::Pending { queued },
        }
    }

    pub fn handle_key(&mut self, key: Key) {
        let effects = self.editor.handle_key(key);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        let mut changes = Vec::new();
        let mut inventory_changed = false;
        for effect in effects {
            match effect {
                Effect::Persist(change) => changes.push(change),
                Effect::InventoryChanged => inventory_changed = true,
                Effect::SwitchDay(date) => self.switch_day(date),
                Effect::Refresh => self.refresh(),
                Effect::Quit => self.should_quit = true,
            }
        }

        if !changes.is_empty() {
            if let Err(e) = self.session.record(&self.editor.schedule, changes) {
                warn!(error = %e, "could not save change");
                self.editor.set_error(format!("save failed: {}", e));
            }
            self.pump();
        }
        if inventory_changed
            && let Err(e) = self.session.save_inventory(&self.editor.inventory)
        {
            warn!(error = %e, "could not save inventory");
            self.editor.set_error(format!("save failed: {}", e));
        }
    }

    fn switch_day(&mut self, date: NaiveDate) {
        match self.session.load_day(date) {
            Ok(day) => {
                debug!(%date, "switch day");
                self.editor.load_day(day);
                self.reload_pending = false;
                self.deferred_day = None;
                if let Some(worker) = &self.worker {
                    worker.request(SyncRequest::FetchDay(date));
                }
            }
            Err(e) => self.editor.set_error(format!("cannot open {}: {}", date, e)),
        }
    }

    fn refresh(&mut self) {
        if self.worker.is_none() {
            self.editor
                .set_status("sync is not set up; showing local data");
            return;
        }
        self.request_refresh();
        self.editor.set_status("refreshing\u{2026}");
    }

    fn request_refresh(&self) {
        if let Some(worker) = &self.worker {
            worker.request(SyncRequest::FetchInventory);
            worker.request(SyncRequest::FetchDay(self.editor.schedule.date));
        }
    }

    /// Hand the head of the journal to the worker when it is due.
    fn pump(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        if let Some((seq, intent)) = self.session.outbox.next_ready(Instant::now())
            && !worker.request(SyncRequest::Send { seq, intent })
        {
            warn!(seq, "sync worker stopped");
        }
    }

    /// Periodic work between key presses: worker reports, file changes,
    /// deferred reloads and the next send.
    pub fn tick(&mut self) {
        let reports = self
            .worker
            .as_ref()
            .map(|w| w.poll())
            .unwrap_or_default();
        for report in reports {
            self.handle_report(report);
        }

        if let Some(watcher) = &self.watcher
            && watcher.poll().contains(&self.editor.schedule.date)
        {
            self.reload_pending = true;
        }

        if !self.editor.is_busy() {
            if self.reload_pending {
                self.reload_from_disk();
            }
            if let Some(day) = self.deferred_day.take() {
                self.accept_remote_day(day);
            }
        }

        self.pump();
    }

    fn reload_from_disk(&mut self) {
        self.reload_pending = false;
        match self.session.load_day(self.editor.schedule.date) {
            Ok(day) if day != self.editor.schedule => {
                info!(date = %day.date, "day changed on disk");
                self.editor.replace_schedule(day);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "reload failed"),
        }
    }

    fn handle_report(&mut self, report: SyncReport) {
        match report {
            SyncReport::Sent { seq } => {
                self.session.outbox.ack(seq);
                self.last_error = None;
                self.save_outbox();
            }
            SyncReport::Failed { seq, error } => {
                match self.session.outbox.fail(seq, &error, Instant::now()) {
                    FailOutcome::Retry { .. } => self.last_error = Some(error.to_string()),
                    FailOutcome::Abandoned(abandoned) => self.roll_back(&abandoned),
                    FailOutcome::Deferred => self.last_error = Some(error.to_string()),
                }
                self.save_outbox();
            }
            SyncReport::Day { date, result } => match result {
                Ok(day) if date == self.editor.schedule.date => {
                    if self.editor.is_busy() {
                        self.deferred_day = Some(day);
                    } else {
                        self.accept_remote_day(day);
                    }
                }
                Ok(_) => {}
                Err(e) => self.editor.set_error(format!("refresh failed: {}", e)),
            },
            SyncReport::Inventory(result) => match result {
                Ok(mut inventory) => {
                    self.session.outbox.overlay_inventory(&mut inventory);
                    if let Err(e) = self.session.store_inventory(&inventory) {
                        warn!(error = %e, "could not save inventory");
                    }
                    self.editor.inventory = inventory;
                }
                Err(e) => self.editor.set_error(format!("refresh failed: {}", e)),
            },
        }
    }

    /// Take the backend's copy unless local changes to that day are still
    /// queued; those would be lost.
    fn accept_remote_day(&mut self, mut day: DaySchedule) {
        if day.date != self.editor.schedule.date || self.session.outbox.has_pending_for(day.date) {
            return;
        }
        day.id_seq.merge(self.editor.schedule.id_seq);
        if let Err(e) = self.session.save_day(&day) {
            warn!(error = %e, "could not save refreshed day");
        }
        self.editor.replace_schedule(day);
    }

    fn roll_back(&mut self, abandoned: &Abandoned) {
        for rollback in abandoned.rollbacks() {
            self.editor.apply_rollback(rollback, &abandoned.reason);
        }
        if let Err(e) = self.session.roll_back(abandoned) {
            warn!(error = %e, "could not write rollback");
        }
        self.last_error = None;
    }

    fn save_outbox(&mut self) {
        if let Err(e) = self.session.save_outbox() {
            warn!(error = %e, "could not save journal");
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Day to open: an explicit date, else the last viewed day when that is
/// still ahead, else today.
fn starting_date(paths: &DataPaths, explicit: Option<NaiveDate>) -> NaiveDate {
    if let Some(date) = explicit {
        return date;
    }
    let today = today();
    read_ui_state(paths)
        .and_then(|s| s.last_date)
        .filter(|d| *d >= today)
        .unwrap_or(today)
}

pub fn run(
    data_dir: Option<&Path>,
    date: Option<NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = DataPaths::resolve(data_dir)?;
    let session = Session::open(paths)?;
    let date = starting_date(&session.paths, date);

    let mut app = App::new(session, date)?;
    match DayWatcher::start(&app.session.paths.days_dir()) {
        Ok(watcher) => app.attach_watcher(watcher),
        Err(e) => warn!(error = %e, "file watcher unavailable"),
    }
    if app.session.config.sync.is_ready() {
        let store = HttpStore::new(&app.session.config.sync)?;
        app.attach_worker(SyncWorker::spawn(store));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal before the panic message prints
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    let state = UiState {
        last_date: Some(app.editor.schedule.date),
    };
    if let Err(e) = write_ui_state(&app.session.paths, &state) {
        warn!(error = %e, "could not save ui state");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(key) = keymap::translate(key)
        {
            app.handle_key(key);
        }
        app.tick();

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
