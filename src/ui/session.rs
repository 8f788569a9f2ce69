//! Runs a [`Shell`] on the tokio runtime against a live [`MovieCatalog`].
use anyhow::{anyhow, Result};
use std::future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use super::shell::{Shell, ShellSnapshot};
use super::{Completion, Effect, Event};
use crate::tmdb::MovieCatalog;

const EVENT_BUFFER: usize = 64;

pub struct SessionHandle {
    events: mpsc::Sender<Event>,
    snapshot: watch::Receiver<ShellSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn send(&self, event: Event) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| anyhow!("session has stopped"))
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShellSnapshot> {
        self.snapshot.clone()
    }

    /// Waits until a published snapshot satisfies `ready`.
    pub async fn wait_for(
        &self,
        ready: impl FnMut(&ShellSnapshot) -> bool,
    ) -> Result<ShellSnapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(ready)
            .await
            .map_err(|_| anyhow!("session has stopped"))?;
        Ok(snapshot.clone())
    }

    /// Closes the event channel and waits for the driver to exit.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.events);
        self.task.await?;
        Ok(())
    }
}

/// Starts a session with a fresh shell and kicks off the catalog load.
pub fn spawn(catalog: Arc<dyn MovieCatalog>) -> SessionHandle {
    spawn_with(Shell::new(Instant::now()), catalog)
}

pub fn spawn_with(shell: Shell, catalog: Arc<dyn MovieCatalog>) -> SessionHandle {
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(shell.snapshot());

    let loader = catalog.clone();
    let loaded_tx = events_tx.clone();
    tokio::spawn(async move {
        let catalog = loader.catalog().await;
        if loaded_tx.send(Event::CatalogLoaded(catalog)).await.is_err() {
            debug!("Session closed before the catalog arrived");
        }
    });

    let task = tokio::spawn(drive(shell, catalog, events_rx, snapshot_tx));
    SessionHandle {
        events: events_tx,
        snapshot: snapshot_rx,
        task,
    }
}

async fn drive(
    mut shell: Shell,
    catalog: Arc<dyn MovieCatalog>,
    mut events: mpsc::Receiver<Event>,
    snapshot: watch::Sender<ShellSnapshot>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    loop {
        let deadline = shell.next_deadline();
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => future::pending::<()>().await,
            }
        };
        let effects = tokio::select! {
            event = events.recv() => match event {
                Some(event) => shell.handle(event, Instant::now()),
                None => break,
            },
            Some(done) = done_rx.recv() => {
                shell.apply(done);
                Vec::new()
            }
            _ = timer => shell.poll(Instant::now()),
        };
        for effect in effects {
            execute(effect, catalog.clone(), done_tx.clone());
        }
        snapshot.send_replace(shell.snapshot());
    }
    info!("Session ended");
}

fn execute(effect: Effect, catalog: Arc<dyn MovieCatalog>, done: mpsc::UnboundedSender<Completion>) {
    tokio::spawn(async move {
        let completion = match effect {
            Effect::SearchMovies { token, query } => Completion::Search {
                token,
                results: catalog.search_movies(&query).await,
            },
            Effect::FetchDetails { token, movie_id } => Completion::Details {
                token,
                movie_id,
                result: catalog.movie_details(movie_id).await,
            },
            Effect::FetchVideos {
                card,
                token,
                movie_id,
            } => Completion::Videos {
                card,
                token,
                result: catalog.movie_videos(movie_id).await,
            },
        };
        // Driver gone means nobody is waiting for this result.
        let _ = done.send(completion);
    });
}
