mod init;
pub use init::{DEFAULT_CONFIG_TEMPLATE, cmd_init};

use chrono::{Local, NaiveDate};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{DataPaths, config_io};
use crate::model::{Block, ClockTime, DaySchedule, Task};
use crate::ops::{block_ops, task_ops};
use crate::session::Session;
use crate::sync::client::{HttpStore, RemoteStore};
use crate::sync::intent::{Change, RemoteIntent, Rollback};
use crate::sync::{self, outbox::Abandoned};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let paths = DataPaths::resolve(cli.data_dir.as_deref())?;
    let date = cli.date.unwrap_or_else(today);

    let Some(command) = cli.command else {
        return Err("no subcommand (run `dp` without arguments for the TUI)".into());
    };
    match command {
        Commands::Init(args) => cmd_init(&paths, args),
        Commands::Parse(args) => cmd_parse(&paths, args, json),
        Commands::Config(cmd) => match cmd.action {
            ConfigAction::Show => cmd_config_show(&paths, json),
            ConfigAction::Set { key, value } => cmd_config_set(&paths, &key, &value),
        },
        Commands::Show => cmd_show(Session::open(paths)?, date, json),
        Commands::Inventory => cmd_inventory(Session::open(paths)?, json),
        Commands::Add(args) => cmd_add(Session::open(paths)?, date, args),
        Commands::Task(args) => cmd_task(Session::open(paths)?, date, args),
        Commands::Rm(args) => cmd_rm(Session::open(paths)?, date, args),
        Commands::Sync(args) => cmd_sync(Session::open(paths)?, date, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Find a block by 1-based number or by start time (`HH:MM`).
fn resolve_block(day: &DaySchedule, spec: &str) -> Result<usize, String> {
    let spec = spec.trim();
    if spec.contains(':') {
        let time = ClockTime::parse(spec).map_err(|e| e.to_string())?;
        return day
            .blocks
            .iter()
            .position(|b| b.start == time)
            .ok_or_else(|| format!("no block starts at {}", time));
    }
    let number: usize = spec
        .parse()
        .map_err(|_| format!("expected a block number or HH:MM, got \"{}\"", spec))?;
    if number == 0 || number > day.blocks.len() {
        return Err(format!(
            "block {} does not exist ({} block(s) on {})",
            number,
            day.blocks.len(),
            day.date
        ));
    }
    Ok(number - 1)
}

fn snapshot(day: &DaySchedule, index: usize) -> Rollback {
    let block = &day.blocks[index];
    Rollback {
        date: day.date,
        block_id: block.id.clone(),
        before: Some(block.clone()),
        index,
        inventory: Vec::new(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(session: Session, date: NaiveDate, json: bool) -> CmdResult {
    let day = session.load_day(date)?;
    let pending = session.outbox.has_pending_for(date);
    if json {
        return print_json(&day_to_json(&day, pending));
    }
    for line in format_day(&day, pending) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_inventory(session: Session, json: bool) -> CmdResult {
    let inventory = session.load_inventory()?;
    if json {
        return print_json(&inventory);
    }
    for line in format_inventory(&inventory) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_parse(paths: &DataPaths, args: ParseArgs, json: bool) -> CmdResult {
    let config = config_io::load_config(paths)?;
    let table = crate::ops::quick_command::QuickCommandTable::with_overrides(&config.quick_commands);
    let Some(command) = table.parse(&args.token) else {
        return Err(format!("\"{}\" is not a quick command", args.token).into());
    };
    if json {
        return print_json(&ParseJson {
            token: &args.token,
            command: &command,
        });
    }
    println!("{} {} at {}", command.block_type, command.label, command.time);
    Ok(())
}

fn cmd_config_show(paths: &DataPaths, json: bool) -> CmdResult {
    let config = config_io::load_config(paths)?;
    if json {
        return print_json(&config);
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_config_set(paths: &DataPaths, key: &str, value: &str) -> CmdResult {
    paths.ensure()?;
    let mut doc = config_io::read_document(paths)?;
    config_io::set_value(&mut doc, key, value)?;
    config_io::write_document(paths, &doc)?;
    println!("{} = {}", key, value);
    Ok(())
}

fn cmd_add(mut session: Session, date: NaiveDate, args: AddArgs) -> CmdResult {
    let table = session.quick_commands();
    let Some(qc) = table.parse(&args.token) else {
        return Err(format!("\"{}\" is not a quick command (try d930 or m14)", args.token).into());
    };
    let mut day = session.load_day(date)?;
    let minutes = args
        .minutes
        .unwrap_or(session.config.schedule.default_block_minutes);
    let mut block = Block::new(block_ops::next_block_id(&mut day), qc.block_type, qc.time, minutes);
    block.label = args
        .label
        .or_else(|| (qc.label != qc.block_type.label()).then_some(qc.label));
    let id = block.id.clone();
    let end = day.blocks.len();
    let index = block_ops::insert_block_sorted(&mut day, end, block);

    let change = Change {
        intent: RemoteIntent::CreateBlock {
            date,
            block: day.blocks[index].clone(),
        },
        rollback: Rollback {
            date,
            block_id: id,
            before: None,
            index,
            inventory: Vec::new(),
        },
    };
    session.record(&day, vec![change])?;
    println!("{}", format_block_line(index + 1, &day.blocks[index]));
    Ok(())
}

fn cmd_task(mut session: Session, date: NaiveDate, args: TaskArgs) -> CmdResult {
    let mut day = session.load_day(date)?;
    let index = resolve_block(&day, &args.block)?;
    let (title, minutes) = task_ops::parse_task_entry(&args.title.join(" "));
    if title.is_empty() {
        return Err("task title cannot be empty".into());
    }
    let rollback = snapshot(&day, index);
    let task = Task::new(
        block_ops::next_task_id(&mut day),
        title,
        minutes.unwrap_or(session.config.schedule.default_task_minutes),
    );
    let block = &mut day.blocks[index];
    let at = block.tasks.len();
    task_ops::insert_task(block, at, task.clone());
    let change = Change {
        intent: RemoteIntent::CreateTask {
            date,
            block_id: block.id.clone(),
            index: at,
            task,
        },
        rollback,
    };
    session.record(&day, vec![change])?;
    println!("{}", format_block_line(index + 1, &day.blocks[index]));
    Ok(())
}

fn cmd_rm(mut session: Session, date: NaiveDate, args: RmArgs) -> CmdResult {
    let mut day = session.load_day(date)?;
    let index = resolve_block(&day, &args.block)?;
    let task_count = day.blocks[index].tasks.len();
    if task_count > 0 && !args.force {
        return Err(format!(
            "block {} has {} task(s); pass --force to delete it",
            index + 1,
            task_count
        )
        .into());
    }
    let rollback = snapshot(&day, index);
    let removed = block_ops::remove_block(&mut day, index).ok_or("block vanished")?;
    let change = Change {
        intent: RemoteIntent::DeleteBlock {
            date,
            block_id: removed.id.clone(),
        },
        rollback,
    };
    session.record(&day, vec![change])?;
    println!("deleted {} {}", removed.start, removed.title());
    Ok(())
}

fn cmd_sync(mut session: Session, date: NaiveDate, args: SyncArgs, json: bool) -> CmdResult {
    if args.status {
        if json {
            let entries: Vec<_> = session.outbox.entries().map(journal_entry_to_json).collect();
            return print_json(&entries);
        }
        if session.outbox.is_empty() {
            println!("nothing queued");
        }
        for entry in session.outbox.entries() {
            println!("{}", format_journal_entry(entry));
        }
        return Ok(());
    }

    if !session.config.sync.is_ready() {
        return Err(format!(
            "sync is not set up: {} change(s) stay queued; set sync.endpoint and sync.user_id",
            session.outbox.len()
        )
        .into());
    }
    let store = HttpStore::new(&session.config.sync)?;

    let mut abandoned: Vec<Abandoned> = Vec::new();
    let summary = sync::drain(&mut session.outbox, &store, |a| {
        eprintln!("rolled back: {} ({})", a.entry.intent.describe(), a.reason);
        abandoned.push(a.clone());
    });
    session.save_outbox()?;
    for a in &abandoned {
        session.roll_back(a)?;
    }

    // Pull fresh copies once nothing local is waiting for that data
    if session.outbox.is_empty() {
        let inventory = store.fetch_inventory()?;
        session.store_inventory(&inventory)?;
        let mut day = store.fetch_day(date)?;
        day.id_seq.merge(session.load_day(date)?.id_seq);
        session.save_day(&day)?;
    }

    if json {
        return print_json(&serde_json::json!({
            "sent": summary.sent,
            "retries": summary.retries,
            "rolled_back": summary.abandoned,
            "remaining": summary.remaining,
        }));
    }
    println!(
        "sent {}, rolled back {}, {} still queued",
        summary.sent, summary.abandoned, summary.remaining
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockType;

    fn day() -> DaySchedule {
        let mut day = DaySchedule::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        for (id, h) in [("b1", 9), ("b2", 14)] {
            day.blocks.push(Block::new(
                id.into(),
                BlockType::Admin,
                ClockTime::new(h, 0).unwrap(),
                30,
            ));
        }
        day
    }

    #[test]
    fn resolve_by_number_and_time() {
        let day = day();
        assert_eq!(resolve_block(&day, "2"), Ok(1));
        assert_eq!(resolve_block(&day, "14:00"), Ok(1));
        assert_eq!(resolve_block(&day, "9:00"), Ok(0));
        assert!(resolve_block(&day, "0").is_err());
        assert!(resolve_block(&day, "3").is_err());
        assert!(resolve_block(&day, "10:00").is_err());
        assert!(resolve_block(&day, "first").is_err());
    }
}
