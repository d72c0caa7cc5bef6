use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use tempfile::TempDir;

use crate::editor::{Editor, Key, KeyCode};
use crate::io::DataPaths;
use crate::model::{Block, BlockType, ClockTime, DaySchedule, Task};
use crate::session::Session;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// The whole screen for `app` at the default test size
pub fn render_app(app: &App) -> String {
    render_to_string(TERM_W, TERM_H, |frame, _| super::render(frame, app))
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// Deep work at 09:00 with one open and one finished task, and a
/// labelled meeting at 14:00.
pub fn sample_day() -> DaySchedule {
    let mut day = DaySchedule::new(test_date());
    let mut work = Block::new(
        "b1".into(),
        BlockType::DeepWork,
        ClockTime::new(9, 0).unwrap(),
        90,
    );
    work.tasks.push(Task::new("t1".into(), "Draft outline".into(), 30));
    let mut done = Task::new("t2".into(), "Review notes".into(), 15);
    done.completed = true;
    work.tasks.push(done);
    day.blocks.push(work);

    let mut meeting = Block::new(
        "b2".into(),
        BlockType::Meeting,
        ClockTime::new(14, 0).unwrap(),
        30,
    );
    meeting.label = Some("Standup".into());
    day.blocks.push(meeting);
    day
}

/// App over a temp data dir; keep the struct alive for the dir to stay.
pub struct TestApp {
    pub app: App,
    _tmp: TempDir,
}

impl TestApp {
    pub fn press(&mut self, key: Key) -> &mut Self {
        self.app.handle_key(key);
        self
    }

    pub fn type_str(&mut self, text: &str) -> &mut Self {
        for c in text.chars() {
            self.app.handle_key(Key::char(c));
        }
        self
    }

    pub fn down(&mut self, times: usize) -> &mut Self {
        for _ in 0..times {
            self.app.handle_key(Key::plain(KeyCode::Down));
        }
        self
    }

    pub fn editor(&self) -> &Editor {
        &self.app.editor
    }
}

pub fn app_with_day(day: DaySchedule) -> TestApp {
    let tmp = TempDir::new().unwrap();
    let session = Session::open(DataPaths::new(tmp.path())).unwrap();
    session.save_day(&day).unwrap();
    let app = App::new(session, day.date).unwrap();
    TestApp { app, _tmp: tmp }
}
