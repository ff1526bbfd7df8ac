use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use figurechat_core::{Config, MockResponder, RemoteResponder, Responder};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "figurechat")]
#[command(about = "Chat with historical figures and custom characters")]
struct Cli {
    /// Answer with placeholder replies instead of calling the server
    #[arg(long)]
    offline: bool,
    /// Base URL of the chat server (overrides FIGURECHAT_API_BASE and the config file)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("could not load config, using defaults: {}", e);
        Config::new()
    });
    let roster = config.roster()?;

    let responder: Arc<dyn Responder> = if cli.offline {
        log::info!("running offline with placeholder answers");
        Arc::new(MockResponder::placeholder())
    } else {
        let mut remote = RemoteResponder::from_config(&config)?;
        if let Some(base) = &cli.api_base {
            remote = remote.with_base_url(base);
        }
        log::info!("using chat server at {}", remote.base_url());
        Arc::new(remote)
    };

    let mut app = App::new(roster, responder);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // A reply wakes the loop as soon as it lands; character uploads are
        // picked up on the next event or tick.
        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event).await?,
                None => break,
            },
            _ = async { app.session.resolve().await.is_some() }, if app.session.is_busy() => {
                app.follow_chat = true;
            }
        }
    }

    Ok(())
}
