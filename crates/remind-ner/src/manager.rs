//! Labeler actor.
//!
//! A single task owns the loaded [`NerProcessor`]. Callers talk to it
//! through a [`NerManager`] handle: configuration changes and predictions
//! are queued as commands, each prediction gets its own reply channel, and
//! lifecycle state is published on a `watch` channel.
//!
//! Initialization runs in a separate task so predictions are answered
//! (with [`NerError::NotReady`]) while assets load. Every initialization
//! carries a generation number; progress and results from a superseded
//! generation are discarded when they arrive. Superseded I/O itself is
//! not cancelled.
//!
//! Predictions run off the command loop but one at a time: a loaded
//! session is never entered concurrently.

use std::sync::Arc;

use remind_core::Entity;
use tokio::sync::{Semaphore, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::assets::{AssetFetcher, ModelAssets};
use crate::runtime::{InferenceBackend, NerProcessor};
use crate::state::NerState;
use crate::{DEFAULT_MAX_LENGTH, NerError};

const COMMAND_QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Configure {
        assets: ModelAssets,
        done: Reply<()>,
    },
    Reinitialize {
        done: Reply<bool>,
    },
    Predict {
        text: String,
        reply: Reply<Result<Vec<Entity>, NerError>>,
    },
    Progress {
        generation: u64,
        percent: u8,
    },
    Installed {
        generation: u64,
        outcome: Result<Arc<NerProcessor>, String>,
    },
}

/// Handle to a running labeler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NerManager {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<NerState>,
}

impl NerManager {
    /// Starts the labeler task with no model configured.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(backend: Arc<dyn InferenceBackend>, fetcher: AssetFetcher) -> Self {
        Self::spawn_with_max_length(backend, fetcher, DEFAULT_MAX_LENGTH)
    }

    pub fn spawn_with_max_length(
        backend: Arc<dyn InferenceBackend>,
        fetcher: AssetFetcher,
        max_length: usize,
    ) -> Self {
        let (commands, inbox) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (state_tx, state) = watch::channel(NerState::NotInitialized);

        let worker = Worker {
            backend,
            fetcher,
            max_length,
            assets: ModelAssets::default(),
            generation: 0,
            processor: None,
            inference_gate: Arc::new(Semaphore::new(1)),
            state: state_tx,
            outbox: commands.downgrade(),
        };
        tokio::spawn(worker.run(inbox));

        Self { commands, state }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NerState {
        self.state.borrow().clone()
    }

    /// Watch channel of lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<NerState> {
        self.state.clone()
    }

    /// Applies new asset locators.
    ///
    /// Identical locators are ignored. Incomplete locators unload the
    /// model. Returns once the labeler has taken the change into account;
    /// loading continues in the background.
    pub async fn configure(&self, assets: ModelAssets) -> Result<(), NerError> {
        let (done, ack) = oneshot::channel();
        self.send(Command::Configure { assets, done }).await?;
        ack.await.map_err(|_| NerError::Closed)
    }

    /// Reloads the current assets. Returns `false` if they are incomplete.
    pub async fn reinitialize(&self) -> Result<bool, NerError> {
        let (done, ack) = oneshot::channel();
        self.send(Command::Reinitialize { done }).await?;
        ack.await.map_err(|_| NerError::Closed)
    }

    /// Labels `text`.
    pub async fn predict(&self, text: &str) -> Result<Vec<Entity>, NerError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Predict {
            text: text.to_string(),
            reply,
        })
        .await?;
        response.await.map_err(|_| NerError::Closed)?
    }

    /// Waits until no initialization is in progress and returns the state.
    pub async fn settled(&self) -> NerState {
        let mut state = self.state.clone();
        match state.wait_for(NerState::is_settled).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.state(),
        }
    }

    /// Forwards every change of a settings channel to [`Self::configure`].
    ///
    /// The current value is applied first. The task ends when the
    /// settings sender or the labeler goes away.
    pub fn follow(&self, mut settings: watch::Receiver<ModelAssets>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                let assets = settings.borrow_and_update().clone();
                if manager.configure(assets).await.is_err() {
                    break;
                }
                if settings.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn send(&self, command: Command) -> Result<(), NerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| NerError::Closed)
    }
}

struct Worker {
    backend: Arc<dyn InferenceBackend>,
    fetcher: AssetFetcher,
    max_length: usize,
    assets: ModelAssets,
    generation: u64,
    processor: Option<Arc<NerProcessor>>,
    inference_gate: Arc<Semaphore>,
    state: watch::Sender<NerState>,
    outbox: mpsc::WeakSender<Command>,
}

impl Worker {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        while let Some(command) = inbox.recv().await {
            match command {
                Command::Configure { assets, done } => {
                    self.configure(assets);
                    let _ = done.send(());
                }
                Command::Reinitialize { done } => {
                    let started = self.assets.is_complete();
                    if started {
                        tracing::debug!("re-initializing labeler");
                        self.start_initialization();
                    } else {
                        tracing::warn!("re-initialization requested without complete assets");
                    }
                    let _ = done.send(started);
                }
                Command::Predict { text, reply } => self.predict(text, reply),
                Command::Progress {
                    generation,
                    percent,
                } => {
                    if generation == self.generation {
                        self.state.send_replace(NerState::Downloading { progress: percent });
                    }
                }
                Command::Installed {
                    generation,
                    outcome,
                } => self.install(generation, outcome),
            }
        }
        tracing::debug!("labeler task stopped");
    }

    fn configure(&mut self, assets: ModelAssets) {
        if assets == self.assets {
            return;
        }
        self.assets = assets;

        if self.assets.is_complete() {
            self.start_initialization();
        } else {
            // Invalidate any in-flight initialization.
            self.generation += 1;
            self.processor = None;
            self.state.send_replace(NerState::NotInitialized);
        }
    }

    fn start_initialization(&mut self) {
        self.generation += 1;
        self.processor = None;
        self.state.send_replace(NerState::Downloading { progress: 0 });

        let Some(outbox) = self.outbox.upgrade() else {
            return;
        };
        let generation = self.generation;
        let assets = self.assets.clone();
        let fetcher = self.fetcher.clone();
        let backend = Arc::clone(&self.backend);
        let max_length = self.max_length;
        tracing::debug!(generation, "starting labeler initialization");

        tokio::spawn(async move {
            let progress_outbox = outbox.clone();
            let progress = move |percent| {
                let _ = progress_outbox.try_send(Command::Progress {
                    generation,
                    percent,
                });
            };

            let outcome = async {
                let cached = fetcher.fetch_all(&assets, progress).await?;
                let processor = tokio::task::spawn_blocking(move || {
                    NerProcessor::load(backend.as_ref(), &cached, max_length)
                })
                .await
                .map_err(|err| NerError::Inference(err.to_string()))??;
                Ok::<_, NerError>(Arc::new(processor))
            }
            .await
            .map_err(|err| err.to_string());

            let _ = outbox
                .send(Command::Installed {
                    generation,
                    outcome,
                })
                .await;
        });
    }

    fn install(&mut self, generation: u64, outcome: Result<Arc<NerProcessor>, String>) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding superseded initialization"
            );
            return;
        }

        match outcome {
            Ok(processor) => {
                tracing::info!("labeler ready");
                self.processor = Some(processor);
                self.state.send_replace(NerState::Ready);
            }
            Err(message) => {
                tracing::warn!(%message, "labeler initialization failed");
                self.state.send_replace(NerState::Error { message });
            }
        }
    }

    fn predict(&self, text: String, reply: Reply<Result<Vec<Entity>, NerError>>) {
        let Some(processor) = self.processor.clone() else {
            let state = self.state.borrow().to_string();
            tracing::warn!(%state, "predict called while labeler not ready");
            let _ = reply.send(Err(NerError::NotReady));
            return;
        };

        let gate = Arc::clone(&self.inference_gate);
        tokio::spawn(async move {
            let Ok(permit) = gate.acquire_owned().await else {
                let _ = reply.send(Err(NerError::Closed));
                return;
            };
            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                processor.predict(&text)
            })
            .await
            .unwrap_or_else(|err| Err(NerError::Inference(err.to_string())));
            let _ = reply.send(result);
        });
    }
}
