use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

#[derive(Debug)]
pub struct ShutdownController {
    forced: AtomicU8,
}

#[derive(Debug, Clone, Copy)]
pub enum ShutdownEvent {
    Graceful,
    Immediate,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            forced: AtomicU8::new(0),
        }
    }

    pub fn bump_forced(&self) -> u8 {
        self.forced.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn spawn_ctrl_c_handler(
    shutdown: Arc<ShutdownController>,
    shutdown_tx: mpsc::UnboundedSender<ShutdownEvent>,
) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            let n = shutdown.bump_forced();
            if n == 1 {
                let _ = shutdown_tx.send(ShutdownEvent::Graceful);
            } else {
                let _ = shutdown_tx.send(ShutdownEvent::Immediate);
                return;
            }
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Finish the current session and run no further ROMs.
    Stop,
    /// Finish the current session, then exit with status 130.
    Abort,
}

/// Sleeps between sequence steps while watching for shutdown requests.
#[derive(Debug)]
pub struct Pacer {
    shutdown_rx: mpsc::UnboundedReceiver<ShutdownEvent>,
    stopping: Option<Flow>,
}

impl Pacer {
    pub fn new(shutdown_rx: mpsc::UnboundedReceiver<ShutdownEvent>) -> Self {
        Self {
            shutdown_rx,
            stopping: None,
        }
    }

    /// Returns [`Flow::Stop`] as soon as a graceful stop was requested and
    /// [`Flow::Abort`] after a second request. Once stopping, every later
    /// sleep returns at once.
    pub async fn sleep(&mut self, duration: Duration) -> Flow {
        if self.stopping == Some(Flow::Abort) {
            return Flow::Abort;
        }
        if self.stopping.is_some() {
            // A second CTRL+C may still be pending.
            return match self.shutdown_rx.try_recv() {
                Ok(ShutdownEvent::Immediate) => self.abort(),
                _ => Flow::Stop,
            };
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Flow::Continue,
            ev = self.shutdown_rx.recv() => match ev {
                Some(ShutdownEvent::Graceful) => {
                    eprintln!("Stop requested — finishing the current session (press CTRL+C again to exit immediately).");
                    self.stopping = Some(Flow::Stop);
                    Flow::Stop
                }
                Some(ShutdownEvent::Immediate) => self.abort(),
                None => {
                    tokio::time::sleep(duration).await;
                    Flow::Continue
                }
            },
        }
    }

    fn abort(&mut self) -> Flow {
        eprintln!("Stop requested again — switching outputs off and exiting.");
        self.stopping = Some(Flow::Abort);
        Flow::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_forced_counts_presses() {
        let shutdown = ShutdownController::new();
        assert_eq!(shutdown.bump_forced(), 1);
        assert_eq!(shutdown.bump_forced(), 2);
    }

    #[tokio::test]
    async fn graceful_request_stops_every_later_sleep() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut pacer = Pacer::new(rx);

        assert_eq!(pacer.sleep(Duration::from_millis(1)).await, Flow::Continue);

        tx.send(ShutdownEvent::Graceful).unwrap();
        assert_eq!(pacer.sleep(Duration::from_secs(60)).await, Flow::Stop);
        assert_eq!(pacer.sleep(Duration::from_secs(60)).await, Flow::Stop);
    }

    #[tokio::test]
    async fn second_request_aborts() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut pacer = Pacer::new(rx);

        tx.send(ShutdownEvent::Graceful).unwrap();
        tx.send(ShutdownEvent::Immediate).unwrap();
        assert_eq!(pacer.sleep(Duration::from_secs(60)).await, Flow::Stop);
        assert_eq!(pacer.sleep(Duration::from_secs(60)).await, Flow::Abort);
        assert_eq!(pacer.sleep(Duration::from_secs(60)).await, Flow::Abort);
    }

    #[tokio::test]
    async fn closed_channel_keeps_pacing() {
        let (tx, rx) = mpsc::unbounded_channel::<ShutdownEvent>();
        drop(tx);
        let mut pacer = Pacer::new(rx);
        assert_eq!(pacer.sleep(Duration::from_millis(1)).await, Flow::Continue);
    }
}
