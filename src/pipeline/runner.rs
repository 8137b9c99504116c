//! Builds the pipeline from configuration and runs it to completion.

use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::analytics::{spawn_writer, Aggregator, AnalyticsHandle, AnalyticsStore};
use crate::config::AppConfig;
use crate::notify::{Dispatcher, HistoryLog, NtfyTransport, Transport};
use crate::trigger::TriggerClassifier;
use crate::watcher::LineTailer;

use super::error::PipelineError;
use super::worker::{ChannelWorker, WorkerStats};

/// A fully wired pipeline, ready to run.
pub struct Pipeline {
    workers: Vec<ChannelWorker>,
    analytics: Option<(AnalyticsHandle, JoinHandle<()>)>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "channels",
                &self.workers.iter().map(ChannelWorker::channel).collect::<Vec<_>>(),
            )
            .field("analytics", &self.analytics.is_some())
            .finish()
    }
}

impl Pipeline {
    /// Build the pipeline with the ntfy transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a component
    /// cannot be set up.
    pub async fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let transport = NtfyTransport::new(&config.server, &config.topic, config.dispatch_timeout())?;
        tracing::info!(url = %transport.url(), "Publishing notifications");
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Build the pipeline with a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a component
    /// cannot be set up.
    pub async fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let mut dispatcher =
            Dispatcher::new(transport, config.rate_limit(), config.dispatch_timeout());
        if let Some(path) = &config.notification_log {
            tracing::info!(path = %path.display(), "Recording notification history");
            dispatcher = dispatcher.with_history(HistoryLog::new(path));
        }
        let dispatcher = Arc::new(dispatcher);

        let analytics = if config.analytics.enabled {
            let store = AnalyticsStore::open(&config.analytics.db_path).await?;
            let aggregator = Aggregator::new(store, config.analytics.pending_timeout()).await?;
            tracing::info!(
                path = %config.analytics.db_path.display(),
                pending = aggregator.pending_count(),
                "Recording interview statistics"
            );
            Some(spawn_writer(
                aggregator,
                config.analytics.maintenance_interval(),
                config.analytics.retention_days,
            ))
        } else {
            None
        };

        let settings = config.classifier_settings();
        let mut workers = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            let classifier = TriggerClassifier::new(source.label(), &settings)?;
            workers.push(ChannelWorker::new(
                classifier,
                LineTailer::at_end(source.dir.clone()),
                dispatcher.clone(),
                analytics.as_ref().map(|(handle, _)| handle.clone()),
                config.poll_interval(),
            ));
        }

        Ok(Self { workers, analytics })
    }

    /// Channel labels in source order.
    #[must_use]
    pub fn channels(&self) -> Vec<&str> {
        self.workers.iter().map(ChannelWorker::channel).collect()
    }

    /// Run every channel worker until `cancel` fires.
    ///
    /// After the workers stop, queued statistics are written before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker task panicked.
    pub async fn run(self, cancel: CancellationToken) -> Result<WorkerStats, PipelineError> {
        let Self { workers, analytics } = self;

        let mut set = JoinSet::new();
        for worker in workers {
            set.spawn(worker.run(cancel.child_token()));
        }

        let mut total = WorkerStats::default();
        let mut failure = None;
        while let Some(result) = set.join_next().await {
            match result {
                Ok(stats) => {
                    total.lines += stats.lines;
                    total.events += stats.events;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Channel worker failed");
                    cancel.cancel();
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some((handle, writer)) = analytics {
            drop(handle);
            if let Err(e) = writer.await {
                tracing::error!(error = %e, "Analytics writer failed");
            }
        }

        match failure {
            Some(e) => Err(PipelineError::Worker(e)),
            None => Ok(total),
        }
    }
}

/// Resolve when the process is asked to stop (Ctrl-C, or SIGTERM on Unix).
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be installed.
pub async fn shutdown_signal() -> Result<(), PipelineError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).map_err(PipelineError::Signal)?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map_err(PipelineError::Signal)?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map_err(PipelineError::Signal)?;
    }
    tracing::info!("Shutdown requested");
    Ok(())
}
