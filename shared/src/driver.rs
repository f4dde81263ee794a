//! Async owner of a [`Session`].
//!
//! User actions and analysis completions are messages handled one at a time
//! on a single task, so transitions never interleave. Each analysis runs on
//! its own task and reports back with its request id.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use uuid::Uuid;

use crate::facade::AnalysisFacade;
use crate::model::ModelClient;
use crate::models::ResultEnvelope;
use crate::session::{SelectedFile, Session, SessionSnapshot};
use crate::{Error, Result};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

enum Command {
    SelectFile(SelectedFile, oneshot::Sender<Result<()>>),
    Analyze(oneshot::Sender<bool>),
    Reset(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

struct Completion {
    request_id: Uuid,
    envelope: ResultEnvelope,
}

/// Cloneable handle to a running session driver.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Stage a file; rejects anything that is not a supported image.
    pub async fn select_file(&self, file: SelectedFile) -> Result<()> {
        self.request(|tx| Command::SelectFile(file, tx)).await?
    }

    /// Start an analysis. Returns `false` when the request was ignored.
    pub async fn analyze(&self) -> Result<bool> {
        self.request(Command::Analyze).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(Command::Reset).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }
}

/// Runs a session against a facade.
pub struct SessionDriver<M> {
    session: Session,
    facade: Arc<AnalysisFacade<M>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
}

impl<M: ModelClient + 'static> SessionDriver<M> {
    /// Spawn the driver task. It stops once every handle is dropped.
    pub fn spawn(facade: Arc<AnalysisFacade<M>>) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let driver = Self {
            session: Session::new(),
            facade,
            completions_tx,
        };
        tokio::spawn(driver.run(commands_rx, completions_rx));

        SessionHandle {
            commands: commands_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(completion) = completions.recv() => {
                    let applied = self.session.complete(completion.request_id, completion.envelope);
                    debug!(request_id = %completion.request_id, applied, "Analysis completed");
                }
                _ = ticker.tick(), if self.session.state().is_in_flight() => self.session.tick(),
            }
        }

        debug!("Session driver stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SelectFile(file, reply) => {
                let _ = reply.send(self.session.select_file(file));
            }
            Command::Analyze(reply) => {
                let started = match self.session.analyze() {
                    Some(ticket) => {
                        info!(request_id = %ticket.request_id, "Starting analysis");
                        let facade = Arc::clone(&self.facade);
                        let completions = self.completions_tx.clone();
                        tokio::spawn(async move {
                            let envelope = facade.analyze(Some(&ticket.data_uri)).await;
                            let _ = completions.send(Completion {
                                request_id: ticket.request_id,
                                envelope,
                            });
                        });
                        true
                    }
                    None => false,
                };
                let _ = reply.send(started);
            }
            Command::Reset(reply) => {
                self.session.reset();
                let _ = reply.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot());
            }
        }
    }
}
