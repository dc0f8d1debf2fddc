mod config;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::{FileConfig, Overrides, Settings};
use swarmtail_api::{ApiClient, Directory, ServiceInfo, StackInfo};
use swarmtail_logs::{
    EndpointBuilder, ServiceLogsEndpoint, StreamConfig, StreamController, StreamFilter,
    SwarmLogsEndpoint, WebSocketTransport, write_export,
};
use swarmtail_tui::{
    Action, AppState, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext, LogViewerScreen,
    Screen, ServiceSelectScreen, StackSelectScreen, Tui,
};

/// swarmtail - live Docker Swarm logs in the terminal
#[derive(Parser, Debug)]
#[command(name = "swarmtail")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Management API base, e.g. https://swarm.example.com/api
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Open the log viewer for this stack
    #[arg(long)]
    stack: Option<String>,

    /// Open the log viewer for this service (requires --stack)
    #[arg(long, requires = "stack")]
    service: Option<String>,

    /// Stream one service by id instead of the merged swarm feed
    #[arg(long, value_name = "ID", conflicts_with_all = ["stack", "service"])]
    service_id: Option<String>,

    /// Lines kept in memory
    #[arg(long)]
    capacity: Option<usize>,

    /// Seconds to wait before reconnecting a dropped stream
    #[arg(long, value_name = "SECS")]
    reconnect_delay: Option<u64>,

    /// Show terminal escape sequences literally instead of as colours
    #[arg(long)]
    no_color: bool,

    /// Directory exports are written to
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,

    /// Config file (default: <config dir>/swarmtail/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Results of background directory requests
enum InternalAction {
    StacksLoaded(Vec<StackInfo>),
    ServicesLoaded {
        stack: String,
        services: Vec<ServiceInfo>,
    },
    LoadFailed(String),
}

/// Long-lived handles the action handler needs
struct AppContext {
    api: ApiClient,
    internal_tx: mpsc::UnboundedSender<InternalAction>,
    export_dir: PathBuf,
}

async fn run_app(args: Args) -> Result<()> {
    let file = FileConfig::discover(args.config.as_deref())?;
    let preset = if args.service_id.is_some() {
        StreamConfig::service()
    } else {
        StreamConfig::swarm()
    };
    let overrides = Overrides {
        api_url: args.api_url.clone(),
        capacity: args.capacity,
        reconnect_delay_secs: args.reconnect_delay,
        no_color: args.no_color,
        export_dir: args.export_dir.clone(),
    };
    let settings = Settings::resolve(overrides, file, preset)?;
    debug!(?settings, "resolved settings");

    let endpoint: Box<dyn EndpointBuilder> = match &args.service_id {
        Some(id) => Box::new(ServiceLogsEndpoint::new(&settings.api_url, id.clone())?),
        None => Box::new(SwarmLogsEndpoint::new(&settings.api_url)?),
    };
    let (mut stream, mut stream_rx) = StreamController::new(
        settings.stream.clone(),
        endpoint,
        Arc::new(WebSocketTransport::default()),
    );

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();

    let ctx = AppContext {
        api: ApiClient::new(settings.api_url.clone())?,
        internal_tx,
        export_dir: settings.export_dir.clone(),
    };
    let api_label = settings.api_url.to_string();

    let mut state = AppState::new();

    // Direct entry points skip the selection screens
    if let Some(id) = &args.service_id {
        state.fixed_service = Some(id.clone());
        state.current_screen = Screen::LogViewer;
        stream.mount(StreamFilter::all());
    } else {
        spawn_load_stacks(&ctx);
        state.ui_state.loading = true;

        if args.stack.is_some() {
            let filter = StreamFilter::new(args.stack.clone(), args.service.clone())
                .context("Invalid stream filter")?;
            state.selected_stack = args.stack.clone();
            state.selected_service = args.service.clone();
            if let Some(stack) = &args.stack {
                spawn_load_services(&ctx, stack.clone());
            }
            state.screen_stack = vec![Screen::StackSelect, Screen::ServiceSelect];
            state.current_screen = Screen::LogViewer;
            stream.mount(filter);
        }
    }

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut state, &stream, &api_label)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.search_active
                            && state.current_screen == Screen::LogViewer
                        {
                            keybindings.get_search_input_action(&key)
                        } else {
                            let context = match state.current_screen {
                                Screen::StackSelect | Screen::ServiceSelect => {
                                    KeyContext::ListNavigation
                                }
                                Screen::LogViewer => KeyContext::LogViewer,
                            };
                            keybindings.get_action(context, &key)
                        };

                        if let Some(action) = action {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                    Event::Error(e) => {
                        warn!(error = %e, "terminal input error");
                        state.show_error(e);
                    }
                }
            }

            Some(event) = stream_rx.recv() => {
                stream.handle_event(event);
            }

            Some(action) = action_rx.recv() => {
                handle_action(&mut state, &mut stream, &ctx, action);
            }

            Some(internal) = internal_rx.recv() => {
                handle_internal(&mut state, internal);
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &stream, &api_label)?;
    }

    stream.unmount();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn spawn_load_stacks(ctx: &AppContext) {
    let api = ctx.api.clone();
    let tx = ctx.internal_tx.clone();
    tokio::spawn(async move {
        let msg = match api.stacks().await {
            Ok(stacks) => InternalAction::StacksLoaded(stacks),
            Err(e) => InternalAction::LoadFailed(format!("Failed to load stacks: {e}")),
        };
        let _ = tx.send(msg);
    });
}

fn spawn_load_services(ctx: &AppContext, stack: String) {
    let api = ctx.api.clone();
    let tx = ctx.internal_tx.clone();
    tokio::spawn(async move {
        let msg = match api.stack_services(&stack).await {
            Ok(services) => InternalAction::ServicesLoaded { stack, services },
            Err(e) => InternalAction::LoadFailed(format!("Failed to load services: {e}")),
        };
        let _ = tx.send(msg);
    });
}

fn handle_internal(state: &mut AppState, internal: InternalAction) {
    match internal {
        InternalAction::StacksLoaded(stacks) => {
            debug!(count = stacks.len(), "stacks loaded");
            state.stacks = stacks;
            state.ui_state.loading = false;
            state.dismiss_error();
        }
        InternalAction::ServicesLoaded { stack, services } => {
            // Ignore answers for a stack the user has since left
            if state.selected_stack.as_deref() != Some(stack.as_str()) {
                return;
            }
            state.services = services;
            state.ui_state.loading = false;
            if state.current_screen == Screen::StackSelect {
                state.navigate_to(Screen::ServiceSelect);
            }
        }
        InternalAction::LoadFailed(msg) => {
            warn!(%msg, "directory request failed");
            state.ui_state.loading = false;
            state.show_error(msg);
        }
    }
}

/// Point the controller at the current selection and show the log viewer
fn open_log_viewer(state: &mut AppState, stream: &mut StreamController) {
    match state.selection_filter() {
        Ok(filter) => {
            state.reset_log_view();
            state.navigate_to(Screen::LogViewer);
            stream.mount(filter);
        }
        Err(e) => state.show_error(e.to_string()),
    }
}

fn handle_action(
    state: &mut AppState,
    stream: &mut StreamController,
    ctx: &AppContext,
    action: Action,
) {
    match action {
        Action::Quit => {
            stream.unmount();
            state.should_quit = true;
        }
        Action::GoBack => {
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
                return;
            }
            if state.current_screen == Screen::LogViewer {
                stream.unmount();
                state.reset_log_view();
            }
            if !state.go_back() {
                state.should_quit = true;
            }
        }
        Action::Navigate(screen) => {
            state.navigate_to(screen);
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }

        // Selection screens
        Action::ListUp => state.list_up(),
        Action::ListDown => state.list_down(),
        Action::ListSelect => {
            if let Some(action) = state.selection_action() {
                handle_action(state, stream, ctx, action);
            }
        }
        Action::SelectStack(None) => {
            state.selected_stack = None;
            state.selected_service = None;
            open_log_viewer(state, stream);
        }
        Action::SelectStack(Some(name)) => {
            state.selected_stack = Some(name.clone());
            state.selected_service = None;
            state.ui_state.loading = true;
            spawn_load_services(ctx, name);
        }
        Action::SelectService(name) => {
            state.selected_service = name;
            open_log_viewer(state, stream);
        }
        Action::RefreshDirectory => match (&state.current_screen, &state.selected_stack) {
            (Screen::ServiceSelect, Some(stack)) => {
                state.ui_state.loading = true;
                spawn_load_services(ctx, stack.clone());
            }
            _ => {
                state.ui_state.loading = true;
                spawn_load_stacks(ctx);
            }
        },

        // Search
        Action::OpenSearch => state.start_search(),
        Action::CloseSearch => state.cancel_search(),
        Action::ApplySearch => state.apply_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear | Action::ClearSearch => state.clear_search(),

        // Scrolling
        Action::ScrollUp(n) => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.auto_scroll = false;
            // Render clamps to the visible line count
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(20);
        }
        Action::PageDown => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(20);
        }
        Action::ScrollToTop => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.auto_scroll = true;
        }

        // Display toggles
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }
        Action::ToggleTimestamps => {
            state.ui_state.show_timestamps = !state.ui_state.show_timestamps;
        }
        Action::ToggleLocalTime => {
            state.ui_state.use_local_time = !state.ui_state.use_local_time;
        }
        Action::ToggleSources => {
            state.ui_state.show_sources = !state.ui_state.show_sources;
        }
        Action::ToggleStats => {
            state.ui_state.stats_visible = !state.ui_state.stats_visible;
        }

        // Stream commands
        Action::TogglePause => stream.toggle_pause(),
        Action::ClearLogs => {
            stream.clear();
            state.ui_state.log_scroll = 0;
        }
        Action::ExportLogs => {
            let lines = state.ui_state.view.visible(stream.buffer()).to_vec();
            match write_export(&ctx.export_dir, &lines) {
                Ok(path) => {
                    info!(path = %path.display(), lines = lines.len(), "exported logs");
                    state.set_status(format!(
                        "Exported {} lines to {}",
                        lines.len(),
                        path.display()
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "export failed");
                    state.show_error(format!("Export failed: {e}"));
                }
            }
        }

        Action::ShowError(msg) => state.show_error(msg),
        Action::DismissError => {
            state.dismiss_error();
            stream.dismiss_error();
        }
        Action::Tick | Action::Render => {}
    }
}

fn render(
    tui: &mut Tui,
    state: &mut AppState,
    stream: &StreamController,
    api_label: &str,
) -> Result<()> {
    tui.draw(|frame| {
        match state.current_screen {
            Screen::StackSelect => StackSelectScreen::render(frame, state, api_label),
            Screen::ServiceSelect => ServiceSelectScreen::render(frame, state),
            Screen::LogViewer => LogViewerScreen::render(frame, state, stream),
        }

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;
    Ok(())
}
