use crate::services::session::SessionStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically drops expired sessions until shutdown is signalled.
pub struct SessionSweeper {
    sessions: Arc<SessionStore>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl SessionSweeper {
    pub fn new(
        sessions: Arc<SessionStore>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sessions,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Session sweeper started");

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Session sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.sweep();
                }
            }
        }
    }

    fn sweep(&self) {
        let removed = self.sessions.purge_expired();
        if removed > 0 {
            tracing::info!("🧹 Removed {} expired sessions", removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let (tx, rx) = watch::channel(false);
        let sweeper = SessionSweeper::new(
            Arc::new(SessionStore::new(1)),
            Duration::from_secs(3600),
            rx,
        );
        let handle = tokio::spawn(sweeper.run());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_sessions() {
        let (_tx, rx) = watch::channel(false);
        let sessions = Arc::new(SessionStore::new(1));
        let live = sessions.create();

        let sweeper = SessionSweeper::new(sessions.clone(), Duration::from_secs(3600), rx);
        sweeper.sweep();
        assert!(sessions.get(&live.token).is_some());
    }
}
