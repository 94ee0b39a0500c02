use anyhow::Result;

mod app;
mod backend;
mod config;
mod conversation;
mod handler;
mod logging;
mod sidebar;
mod sources;
mod theme;
mod tui;
mod ui;
mod upload;

use app::App;
use backend::{BackendClient, Dispatcher};
use config::Config;
use theme::Theme;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = logging::init();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let theme = config
        .theme
        .as_deref()
        .and_then(Theme::from_name)
        .unwrap_or_default();
    let server = std::env::var("DOCCHAT_SERVER")
        .ok()
        .or_else(|| config.server.clone())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());

    tracing::info!(server = %server, "starting docchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    // Keep the terminal restorable whatever the run loop returns
    let result = run(&mut terminal, theme, &server).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, theme: Theme, server: &str) -> Result<()> {
    let mut events = tui::EventHandler::new();
    let dispatcher = Dispatcher::new(BackendClient::new(server), events.sender());
    let mut app = App::new(theme);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => {
                if let Some(command) = handler::handle_event(&mut app, event)? {
                    dispatcher.dispatch(command);
                }
            }
            None => break,
        }
    }

    tracing::info!("shutting down");
    Ok(())
}
