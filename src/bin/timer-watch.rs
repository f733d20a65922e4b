//! Timer Watch - terminal client for a timer-sync server
//!
//! Mirrors the server's timers, prints them whenever they change and reads
//! control commands from stdin.

use tokio::{
    io::{stdin, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

use timer_sync::{
    client::{Reconciler, Session, UserAction, Visual},
    config::WatchConfig,
    utils::format_clock,
};

const HELP: &str = "\
commands:
  start <timer>                  start counting down
  pause <timer>                  pause the countdown
  set <timer> <minutes> [secs]   reset to a new duration
  edit <timer>                   open the label editor
  name|task|queue <timer> <text> change a label in the editor
  save <timer>                   send the edited labels
  cancel <timer>                 close the editor without saving
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WatchConfig::parse();

    // Logs go to stderr so they don't interleave with the table on stdout
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_sync={},timer_watch={}", config.log_level(), config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Connecting to {}", config.origin);
    println!("{}", HELP);

    let (action_tx, action_rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match line.parse::<UserAction>() {
                    Ok(action) => {
                        if action_tx.send(action).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    let session = Session::new(Reconciler::default(), action_rx, render);
    session.run(&config.origin).await;

    info!("Bye");
    Ok(())
}

fn render(reconciler: &Reconciler) {
    println!();
    for (id, timer) in reconciler.timers() {
        let record = &timer.record;
        let marker = match timer.visual() {
            Visual::Normal => "  ",
            Visual::Flash => "**",
            Visual::Alert => "! ",
        };
        let queue = record
            .queue
            .as_deref()
            .map(|q| format!(" -> {}", q))
            .unwrap_or_default();
        let editing = if timer.editor.is_some() { " [editing]" } else { "" };

        println!(
            "{} {:<8} {} / {}  {:<7}  {}: {}{}{}",
            marker,
            id,
            format_clock(record.remaining),
            format_clock(record.total_duration),
            record.phase().label(),
            record.name,
            record.task,
            queue,
            editing,
        );
    }
}
