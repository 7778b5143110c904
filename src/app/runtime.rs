//! TUI runtime for the kiosk
//!
//! One loop owns the session. Each pass it:
//! - forwards branch changes
//! - ticks the countdowns once per elapsed second
//! - drains background results
//! - draws the frame and reads a key

use crate::api::ApiClient;
use crate::app::messages::BackgroundMessage;
use crate::app::{background, input, RuntimeContext};
use crate::branch::{BranchContext, BranchSubscription};
use crate::config::Config;
use crate::kiosk::{Event as KioskEvent, KioskSession, KioskSettings};
use crate::ui::{self, App, ToastKind};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::info;

const TICK: Duration = Duration::from_secs(1);
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Run the kiosk until the operator quits
pub async fn run_tui(config: Config, api: ApiClient) -> Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let branches = BranchContext::new(config.branch.clone());
    let settings = KioskSettings {
        api_base: api.base_url().clone(),
        idle_secs: config.idle_timeout_secs,
        return_secs: config.return_countdown_secs,
    };
    let session = KioskSession::new(branches.current(), settings);
    let mut app = App::new(session, config.privacy_notice.clone());

    let (tx, rx) = mpsc::channel::<BackgroundMessage>();
    let download_dir = config.download_dir();
    info!(
        branch = %config.branch.id,
        api = %api.base_url(),
        "kiosk started"
    );

    let ctx = RuntimeContext {
        api: &api,
        tx: &tx,
        branches: &branches,
        config: &config,
        download_dir: &download_dir,
    };
    let result = run_loop(&mut terminal, &mut app, &rx, branches.subscribe(), &ctx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("kiosk stopped");
    result
}

/// Main event loop with background message handling
fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: &mpsc::Receiver<BackgroundMessage>,
    mut branch_changes: BranchSubscription,
    ctx: &RuntimeContext,
) -> Result<()> {
    let mut next_tick = Instant::now() + TICK;

    loop {
        app.clear_expired_toast();

        if let Some(branch) = branch_changes.poll_change() {
            let notice = format!("Sucursal: {}", branch.name);
            background::dispatch(app, KioskEvent::BranchChanged(branch), ctx);
            app.show_toast(&notice, ToastKind::Info);
        }

        // Catch up on every whole second that passed, even after a slow frame
        while Instant::now() >= next_tick {
            background::dispatch(app, KioskEvent::Tick, ctx);
            next_tick += TICK;
        }

        background::drain_messages(app, rx, ctx);

        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(INPUT_POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                input::handle_key_event(app, key, ctx)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
