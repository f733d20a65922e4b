//! Reconnecting WebSocket session driving a [`Reconciler`]

use std::{future, time::Duration};
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::mpsc,
    time::{sleep, sleep_until, Instant},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::{
    actions::{Outcome, UserAction},
    reconciler::Reconciler,
};
use crate::protocol::{ClientMessage, ServerMessage, TimerCommand};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a connection phase ended
enum Exit {
    Quit,
    Disconnected,
}

/// One client's view of the server, kept across reconnects.
///
/// Flash sequences keep stepping while disconnected; commands issued while
/// offline are applied locally only and get overwritten by the snapshot that
/// follows the next successful connect. Once the action channel closes the
/// session keeps mirroring as a read-only viewer.
pub struct Session<F> {
    reconciler: Reconciler,
    actions: mpsc::Receiver<UserAction>,
    input_open: bool,
    render: F,
}

impl<F> Session<F>
where
    F: FnMut(&Reconciler),
{
    pub fn new(reconciler: Reconciler, actions: mpsc::Receiver<UserAction>, render: F) -> Self {
        Self {
            reconciler,
            actions,
            input_open: true,
            render,
        }
    }

    /// Connect to `origin` and keep the mirror in sync until the user quits
    pub async fn run(mut self, origin: &str) -> Reconciler {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            match connect_async(origin).await {
                Ok((mut ws, _)) => {
                    info!("Connected to {}", origin);
                    backoff = INITIAL_BACKOFF;
                    if let Exit::Quit = self.drive(&mut ws).await {
                        let _ = ws.close(None).await;
                        return self.reconciler;
                    }
                    warn!("Connection to {} lost", origin);
                }
                Err(e) => warn!("Failed to connect to {}: {}", origin, e),
            }

            debug!("Reconnecting in {:?}", backoff);
            if let Exit::Quit = self.wait(backoff).await {
                return self.reconciler;
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn drive(&mut self, ws: &mut WsStream) -> Exit {
        loop {
            tokio::select! {
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => match ServerMessage::decode(text.as_str()) {
                        Ok(ServerMessage::StateUpdate(snapshot)) => {
                            self.reconciler.apply_snapshot(&snapshot);
                            (self.render)(&self.reconciler);
                        }
                        Err(e) => warn!("Ignoring server message: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => return Exit::Disconnected,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        return Exit::Disconnected;
                    }
                },

                _ = flash_due(self.reconciler.next_flash()) => self.step_flash(),

                action = self.actions.recv(), if self.input_open => match self.handle_action(action) {
                    Err(exit) => return exit,
                    Ok(Some(command)) => {
                        if let Err(e) = send_command(ws, command).await {
                            warn!("Failed to send command: {}", e);
                            return Exit::Disconnected;
                        }
                    }
                    Ok(None) => {}
                },
            }
        }
    }

    /// Sit out a reconnect delay while still serving flashes and local actions
    async fn wait(&mut self, delay: Duration) -> Exit {
        let deadline = sleep(delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => return Exit::Disconnected,
                _ = flash_due(self.reconciler.next_flash()) => self.step_flash(),
                action = self.actions.recv(), if self.input_open => match self.handle_action(action) {
                    Err(exit) => return exit,
                    Ok(Some(command)) => {
                        debug!(timer_id = %command.timer_id, "Offline, command not sent");
                    }
                    Ok(None) => {}
                },
            }
        }
    }

    fn step_flash(&mut self) {
        if self.reconciler.advance_flash(Instant::now()) {
            (self.render)(&self.reconciler);
        }
    }

    /// Apply one user action locally, returning the command to send if any
    fn handle_action(&mut self, action: Option<UserAction>) -> Result<Option<TimerCommand>, Exit> {
        let action = match action {
            Some(UserAction::Quit) => return Err(Exit::Quit),
            Some(action) => action,
            None => {
                info!("Input closed, watching only");
                self.input_open = false;
                return Ok(None);
            }
        };

        match action.apply(&mut self.reconciler) {
            Outcome::Send(command) => {
                (self.render)(&self.reconciler);
                Ok(Some(command))
            }
            Outcome::Local => {
                (self.render)(&self.reconciler);
                Ok(None)
            }
            Outcome::Ignored => {
                debug!("Action had no effect");
                Ok(None)
            }
        }
    }
}

/// Resolves when the next flash toggle is due, or never if nothing is flashing
async fn flash_due(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

async fn send_command(ws: &mut WsStream, command: TimerCommand) -> anyhow::Result<()> {
    let text = ClientMessage::from(command).encode()?;
    ws.send(Message::text(text)).await?;
    Ok(())
}
