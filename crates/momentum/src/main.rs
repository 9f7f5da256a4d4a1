//! Momentum - terminal driver for the candle engine.
//!
//! Loads a snapshot, selects the first direction and the aggregate, then
//! polls the refresh tick while reading commands from stdin:
//! key names (`ArrowLeft`, `+`, `0`, ...), `pan <px>`, `wheel <dy> <x>`,
//! `period <code>`, `select <id>`, `primary`, `aggregate`,
//! `breakdown <index>`, `export <path>`, `quit`.
//!
//! The loaded snapshot is never written back. A changed zoom is saved to the
//! config file on exit; `export` writes the current data to a new file.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Interval, MissedTickBehavior};

use momentum::{
    action_for_key, action_for_wheel, format_at, ChartId, Engine, Refresh, SystemClock, ViewWindow, ViewportAction,
};
use momentum_config::Config;
use momentum_core::{Period, AGGREGATE_ID};
use momentum_data::validation::{validate_candle, validate_links};
use momentum_data::{save_snapshot, DataSource, EntitySource, InMemoryStore, JsonLoader, Snapshot};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Action(ViewportAction),
    Period(Period),
    Select(String),
    Target(ChartId),
    Breakdown(usize),
    Export(PathBuf),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let arg = parts.next();
    match head {
        "quit" | "q" => Some(Command::Quit),
        "primary" => Some(Command::Target(ChartId::Primary)),
        "aggregate" => Some(Command::Target(ChartId::Aggregate)),
        "period" => Period::from_code(arg?).map(Command::Period),
        "select" => arg.map(|id| Command::Select(id.to_string())),
        "breakdown" => arg?.parse().ok().map(Command::Breakdown),
        "export" => arg.map(|path| Command::Export(PathBuf::from(path))),
        "pan" => arg?.parse().ok().map(|dx| Command::Action(ViewportAction::Pan(dx))),
        "wheel" => {
            let delta_y = arg?.parse().ok()?;
            let fraction = parts.next().and_then(|f| f.parse().ok()).unwrap_or(0.5);
            action_for_wheel(delta_y, fraction).map(Command::Action)
        }
        key => action_for_key(key).map(Command::Action),
    }
}

fn new_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

fn print_window(chart: ChartId, period: Option<Period>, window: &ViewWindow) {
    let Some(last) = window.candles.last() else {
        return;
    };
    let at = period
        .and_then(|p| format_at(last.display_at, p.display_unit()))
        .unwrap_or_default();
    let position = window
        .position_label()
        .unwrap_or_else(|| format!("all {} candles", window.total_candles));
    let notes = window.annotated.iter().filter(|a| **a).count();
    println!(
        "{:?}: {} | {} O {:.2} H {:.2} L {:.2} C {:.2}{} | {} notes",
        chart,
        position,
        at,
        last.open,
        last.high,
        last.low,
        last.close,
        if last.is_active { " (live)" } else { "" },
        notes
    );
}

fn report(refresh: &Refresh, period: Option<Period>) {
    log::debug!("{:?}: {}", refresh.chart, refresh.countdown.countdown_label());
    let Some(window) = &refresh.window else {
        return;
    };
    if !window.candles.iter().all(validate_candle) || !validate_links(&window.candles) {
        log::warn!("{:?}: refreshed window failed validation", refresh.chart);
    }
    log::info!(
        "{:?}: refreshed {} candles ({}..={} of {})",
        refresh.chart,
        window.visible_count,
        window.start_index,
        window.end_index,
        window.total_candles
    );
    print_window(refresh.chart, period, window);
}

async fn drive(engine: &mut Engine<InMemoryStore>, config: &Config, loaded: &Snapshot, source: &Path) -> Result<()> {
    let tick = Duration::from_millis(config.refresh.tick_ms.max(1));
    let mut interval = new_interval(tick);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut target = ChartId::Primary;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for refresh in engine.tick() {
                    report(&refresh, engine.selected_period(refresh.chart));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let Some(command) = parse_command(&line) else {
                    println!("unknown command: {}", line.trim());
                    continue;
                };
                match command {
                    Command::Quit => break,
                    Command::Target(chart) => target = chart,
                    Command::Action(action) => engine.apply(target, action),
                    Command::Select(id) => {
                        let period = engine.selected_period(ChartId::Primary).unwrap_or(config.general.period());
                        engine.select(ChartId::Primary, &id, period);
                        target = ChartId::Primary;
                    }
                    Command::Period(period) => {
                        for chart in [ChartId::Primary, ChartId::Aggregate] {
                            if let Some(id) = engine.selected_entity(chart).map(str::to_string) {
                                engine.select(chart, &id, period);
                            }
                        }
                        // Drop the old timer so only one tick drives the charts.
                        interval = new_interval(tick);
                        println!("{}", period.current_interval(engine.now_ms()).countdown_label());
                    }
                    Command::Breakdown(index) => {
                        let period = engine.selected_period(ChartId::Aggregate).unwrap_or(config.general.period());
                        for part in engine.aggregate_breakdown(period, index).unwrap_or_default() {
                            println!("{:>10.2}  {} ({} scores)", part.sum, part.entity_name, part.count);
                        }
                        continue;
                    }
                    Command::Export(path) => {
                        if let Err(e) = export(engine, loaded, source, &path) {
                            println!("export failed: {e:#}");
                        }
                        continue;
                    }
                }
                match engine.view_window(target) {
                    Some(window) => print_window(target, engine.selected_period(target), &window),
                    None => println!("{:?}: no data", target),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// Write the current data to `target`, keeping everything else `loaded` had.
fn export(engine: &Engine<InMemoryStore>, loaded: &Snapshot, source: &Path, target: &Path) -> Result<()> {
    let same_file = match (target.canonicalize(), source.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => target == source,
    };
    if same_file {
        anyhow::bail!("{} is the loaded snapshot; export to a new file", target.display());
    }

    let visible = engine.zoom(ChartId::Primary).visible_count;
    let snapshot = loaded.updated_from(engine.source(), Some(visible), engine.now_ms());
    save_snapshot(target, &snapshot).with_context(|| format!("Failed to write {}", target.display()))?;
    log::info!("Exported snapshot to {}", target.display());
    Ok(())
}

fn save_zoom(config: &Config, path: &Path, visible: usize) -> Result<()> {
    let mut config = config.clone();
    config.viewport.default_visible_count = visible;
    config.save(path).with_context(|| format!("Failed to save {}", path.display()))?;
    log::info!("Saved zoom preference to {}", path.display());
    Ok(())
}

fn run() -> Result<()> {
    env_logger::init();

    let found = Config::find();
    let has_config_file = found.is_some();
    let (config_path, config) = found.unwrap_or_else(|| (Config::default_path(), Config::default()));
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.general.data_path.clone())
        .context("No snapshot given: pass a path or set general.data_path")?;

    let snapshot = JsonLoader::new(&path)
        .load()
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let store = snapshot.clone().into_store()?;

    let dirty = Rc::new(Cell::new(false));
    let flag = Rc::clone(&dirty);
    let mut engine = Engine::new(store, &config, SystemClock).with_hook(move || flag.set(true));

    let period = config.general.period();
    if let Some(first) = engine.source().live_entities().first().map(|e| e.id.clone()) {
        engine.select(ChartId::Primary, &first, period);
    }
    engine.select(ChartId::Aggregate, AGGREGATE_ID, period);
    // A snapshot's zoom only seeds the view when no config file holds one.
    if let Some(count) = snapshot.visible_count().filter(|_| !has_config_file) {
        engine.set_visible_count(ChartId::Primary, count);
        engine.set_visible_count(ChartId::Aggregate, count);
    }
    dirty.set(false);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(drive(&mut engine, &config, &snapshot, &path))?;

    if dirty.get() {
        save_zoom(&config, &config_path, engine.zoom(ChartId::Primary).visible_count)?;
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
    }
}
