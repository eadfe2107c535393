use crate::{
    clock::Clock,
    config::Config,
    info,
    journal::Journal,
    kv::FileStore,
    session::{format_elapsed, Session, KICK_TARGET},
    store::SessionStore,
    ticker::Ticker,
    timer::{KickOutcome, SessionTimer, TimerPhase},
};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub struct Context {
    pub config: Config,
    pub store: SessionStore<FileStore>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        let store = SessionStore::new(
            FileStore::new(config.data_dir()),
            config.storage.key.clone(),
        );
        Self {
            config,
            store,
            clock,
        }
    }
}

/// Print the past records once
pub fn print_sessions(ctx: &Context, json: bool) -> Result<()> {
    if json {
        let sessions = ctx.store.load_all()?;
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    let (sessions, err) = ctx.store.load_or_empty();
    if let Some(e) = err {
        eprintln!("Warning: could not read past records: {}", e);
    }
    print!("{}", render_home(&sessions));
    Ok(())
}

pub fn render_home(sessions: &[Session]) -> String {
    let mut out = format!("DFM (kick counter)  [{} sessions]\n\nPast records\n", sessions.len());
    if sessions.is_empty() {
        out.push_str("  No records yet\n");
    }
    for session in sessions {
        out.push_str(&format!("  {}\n", session.list_line()));
    }
    out
}

/// Home screen. Past records are reloaded each time the screen is shown.
pub fn run_home(ctx: &Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    print_sessions(ctx, false)?;
    println!("\n/record to start counting, /help for commands, /exit to quit");

    loop {
        match rl.readline("kickcount> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match line {
                    "/exit" | "/quit" => break,
                    "/help" => {
                        println!("Commands:");
                        println!("  /record  - record fetal movement");
                        println!("  /list    - show past records");
                        println!("  /info    - how to count kicks");
                        println!("  /exit    - quit");
                    }
                    "/list" => print_sessions(ctx, false)?,
                    "/info" => println!("{}", info::render()),
                    "/record" => {
                        if let Err(e) = run_record(ctx, &mut rl) {
                            eprintln!("Error: {}", e);
                        }
                        // Back on the home screen
                        println!();
                        print_sessions(ctx, false)?;
                    }
                    other => println!("Unknown command: {}", other),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Recording screen loop; returns when the user goes back or saves.
pub fn run_record(ctx: &Context, rl: &mut DefaultEditor) -> Result<()> {
    let mut screen = RecordScreen::new(ctx);
    println!("Record DFM - stop recording after {} kicks", KICK_TARGET);
    println!("/toggle to start, Enter to record a kick, /save once done, /back to leave");

    loop {
        let prompt = screen.prompt();
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line)?;
                }
                match screen.handle(line) {
                    ScreenAction::Stay(message) => println!("{}", message),
                    ScreenAction::Leave(message) => {
                        println!("{}", message);
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("{}", screen.back());
                break;
            }
            Err(e) => {
                screen.back();
                return Err(e.into());
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScreenAction {
    Stay(String),
    Leave(String),
}

/// State behind one visit to the recording screen
pub struct RecordScreen<'a> {
    ctx: &'a Context,
    timer: Arc<Mutex<SessionTimer>>,
    ticker: Option<Ticker>,
    journal: Option<Journal>,
}

impl<'a> RecordScreen<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        let journal = if ctx.config.journal.enabled {
            let path = ctx
                .config
                .journal_dir()
                .join(format!("{}.jsonl", ctx.clock.now().format("%Y-%m-%d")));
            match Journal::open(&path, ctx.clock.clone()) {
                Ok(journal) => Some(journal),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "journal disabled");
                    None
                }
            }
        } else {
            None
        };

        Self {
            ctx,
            timer: Arc::new(Mutex::new(SessionTimer::new(ctx.clock.clone()))),
            ticker: None,
            journal,
        }
    }

    fn timer(&self) -> MutexGuard<'_, SessionTimer> {
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn prompt(&self) -> String {
        let state = self.timer().state();
        format!(
            "[{}] kicks {}/{} > ",
            format_elapsed(state.elapsed_seconds),
            state.kick_count,
            KICK_TARGET
        )
    }

    pub fn handle(&mut self, line: &str) -> ScreenAction {
        match line {
            "" | "/kick" | "k" => ScreenAction::Stay(self.kick()),
            "/toggle" | "/start" | "/pause" | "p" => ScreenAction::Stay(self.toggle()),
            "/save" => self.save(),
            "/status" => ScreenAction::Stay(self.status()),
            "/info" => ScreenAction::Stay(info::render()),
            "/back" => ScreenAction::Leave(self.back()),
            "/help" => ScreenAction::Stay(
                [
                    "Commands:",
                    "  <Enter>, /kick - record a kick (timer must be running)",
                    "  /toggle        - start or pause the timer",
                    "  /save          - save the session once 10 kicks are counted",
                    "  /status        - show timer and kick count",
                    "  /info          - how to count kicks",
                    "  /back          - leave without saving",
                ]
                .join("\n"),
            ),
            other => ScreenAction::Stay(format!("Unknown command: {}", other)),
        }
    }

    pub fn toggle(&mut self) -> String {
        let (phase, elapsed, kicks) = {
            let mut timer = self.timer();
            let phase = timer.toggle_run();
            (phase, timer.elapsed_seconds(), timer.kick_count())
        };
        self.sync_ticker();
        match phase {
            TimerPhase::Running => {
                self.journal_event(|j| j.started(elapsed, kicks));
                "Timer running".to_string()
            }
            TimerPhase::Complete => "Already at 10 kicks, /save to keep this session".to_string(),
            _ => {
                self.journal_event(|j| j.paused(elapsed, kicks));
                format!("Paused at {}", format_elapsed(elapsed))
            }
        }
    }

    pub fn kick(&mut self) -> String {
        let (outcome, elapsed, running) = {
            let mut timer = self.timer();
            let outcome = timer.record_kick();
            (outcome, timer.elapsed_seconds(), timer.is_running())
        };
        match outcome {
            KickOutcome::Ignored if !running && self.timer().can_save() => {
                "10 kicks counted, /save to keep this session".to_string()
            }
            KickOutcome::Ignored => "Start the timer to record kicks".to_string(),
            KickOutcome::Counted(n) => {
                self.journal_event(|j| j.kick(elapsed, n));
                format!("Kick {}/{}", n, KICK_TARGET)
            }
            KickOutcome::Completed => {
                self.sync_ticker();
                self.journal_event(|j| j.kick(elapsed, KICK_TARGET));
                self.journal_event(|j| j.completed(elapsed));
                format!(
                    "Kick {0}/{0} in {1}. Timer stopped, /save to keep this session",
                    KICK_TARGET,
                    format_elapsed(elapsed)
                )
            }
        }
    }

    pub fn save(&mut self) -> ScreenAction {
        let result = {
            let mut timer = self.timer();
            if !timer.can_save() {
                return ScreenAction::Stay(format!(
                    "Save is available after {} kicks ({} so far)",
                    KICK_TARGET,
                    timer.kick_count()
                ));
            }
            timer.save(&self.ctx.store)
        };

        match result {
            Ok(Some(session)) => {
                self.sync_ticker();
                self.journal_event(|j| j.saved(&session.id, session.minutes));
                ScreenAction::Leave(format!("Saved: {}", session.list_line()))
            }
            Ok(None) => ScreenAction::Stay("Nothing to save".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "save failed");
                let message = e.to_string();
                self.journal_event(|j| j.save_failed(&message));
                ScreenAction::Stay(format!(
                    "Could not save ({}). Your kicks are kept, try /save again",
                    message
                ))
            }
        }
    }

    pub fn status(&self) -> String {
        let timer = self.timer();
        let state = timer.state();
        let mut line = format!(
            "{} | kicks {}/{} | {}",
            format_elapsed(state.elapsed_seconds),
            state.kick_count,
            KICK_TARGET,
            timer.phase().as_str()
        );
        if let Some(started) = timer.started_at() {
            line.push_str(&format!(" | started {}", started.format("%H:%M:%S UTC")));
        }
        line
    }

    /// Leave the screen, dropping unsaved progress
    pub fn back(&mut self) -> String {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        let (elapsed, kicks, had_progress) = {
            let mut timer = self.timer();
            let elapsed = timer.elapsed_seconds();
            let kicks = timer.kick_count();
            (elapsed, kicks, timer.discard())
        };
        if had_progress {
            self.journal_event(|j| j.discarded(elapsed, kicks));
            format!("Discarded unsaved session ({} kicks, {})", kicks, format_elapsed(elapsed))
        } else {
            "Back".to_string()
        }
    }

    /// Run the ticker exactly while the timer is running
    fn sync_ticker(&mut self) {
        let running = self.timer().is_running();
        let ticking = self.ticker.as_ref().is_some_and(Ticker::is_active);

        if running && !ticking {
            let timer = self.timer.clone();
            let interval = Duration::from_millis(self.ctx.config.timer.tick_ms);
            match Ticker::start(interval, move || {
                timer.lock().unwrap_or_else(|e| e.into_inner()).tick();
            }) {
                Ok(ticker) => self.ticker = Some(ticker),
                Err(e) => tracing::error!(error = %e, "failed to start ticker"),
            }
        } else if !running {
            if let Some(mut ticker) = self.ticker.take() {
                ticker.cancel();
            }
        }
    }

    fn journal_event<F>(&mut self, event: F)
    where
        F: FnOnce(&mut Journal) -> Result<()>,
    {
        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = event(journal) {
                tracing::warn!(path = %journal.path.display(), error = %e, "journal write failed");
            }
        }
    }

    #[cfg(test)]
    fn ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| t.is_active())
    }
}

impl Drop for RecordScreen<'_> {
    fn drop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }
}
