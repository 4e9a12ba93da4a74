use click_pilot::app::{AutomationApp, StatusCallback, StatusEvent};
use click_pilot::logging;
use click_pilot::settings::{ClickMode, ClickerSettings};
use click_pilot::watcher::WatcherConfig;
use std::sync::Arc;

const SETTINGS_FILE: &str = "clicker.json";
const WATCHER_FILE: &str = "watcher.json";

fn print_help() {
    println!(
        "click_pilot {}

Usage:
  click_pilot run [mode]     Run the auto clicker (mode: toggle, hold, double,
                             random, burst, rotation; default from {SETTINGS_FILE})
  click_pilot watch          Run the screen watcher from {WATCHER_FILE}
  click_pilot version        Print the current version
  click_pilot help           Show this help message

Options:
  --verbose, -v              Enable verbose logging
",
        env!("CARGO_PKG_VERSION")
    );
}

fn status_printer() -> StatusCallback {
    Arc::new(|event: StatusEvent| match event {
        StatusEvent::Clicker(status) => {
            tracing::info!(
                running = status.running,
                mode = %status.mode,
                "clicker status"
            );
        }
        StatusEvent::Recording { recording } => {
            tracing::info!(recording, "recording status");
        }
        StatusEvent::Watcher(status) => {
            tracing::info!(
                running = status.running,
                error = status.error.as_deref().unwrap_or(""),
                "watcher status"
            );
        }
    })
}

fn run_clicker(mode_arg: Option<&str>) -> anyhow::Result<()> {
    let mut settings = ClickerSettings::load(SETTINGS_FILE)?;
    if let Some(arg) = mode_arg {
        settings.mode = ClickMode::parse(arg)
            .ok_or_else(|| anyhow::anyhow!("unknown mode '{arg}'"))?;
    }

    let app = AutomationApp::with_system_backends(Some(status_printer()))?;
    app.hotkeys().spawn_listener();

    tracing::info!(
        "starting {} mode; press '{}' to engage, '{}' to stop",
        settings.mode,
        settings.click_key,
        settings.stop_key
    );
    app.start_clicker(settings)?;
    app.run_clicker();
    Ok(())
}

fn run_watcher() -> anyhow::Result<()> {
    let content = std::fs::read_to_string(WATCHER_FILE)
        .map_err(|e| anyhow::anyhow!("failed to read {WATCHER_FILE}: {e}"))?;
    let config: WatcherConfig = serde_json::from_str(&content)?;

    let app = AutomationApp::with_system_backends(Some(status_printer()))?;
    tracing::info!(
        "watching {:?} every {}ms",
        config.template_path,
        config.poll_interval_ms
    );
    app.start_watcher(config)?;
    app.run_watcher();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    let mut positional = args.iter().filter(|a| !a.starts_with('-'));
    let command = positional.next().map(String::as_str);

    logging::init(verbose);

    match command {
        Some("run") => run_clicker(positional.next().map(String::as_str)),
        Some("watch") => run_watcher(),
        Some("version") => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            eprintln!("Run \"click_pilot help\" for usage information.");
            std::process::exit(1);
        }
    }
}
