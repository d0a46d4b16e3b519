//! Process-level fault capture.
//!
//! Panics are caught by a hook installed at startup; background tasks are
//! spawned through [`FaultReporter`] so an error nobody awaits still reaches
//! the supervisor.

use session_supervisor::{Fault, FaultSource, SupervisorHandle};
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Somewhere to deliver faults.
pub trait FaultSink: Send + Sync + 'static {
    fn report(&self, fault: Fault);
}

impl FaultSink for SupervisorHandle {
    fn report(&self, fault: Fault) {
        if let Err(e) = self.fault(fault) {
            error!(error = %e, "Fault dropped, supervisor is not running");
        }
    }
}

/// Spawns background tasks and reports their failures as faults.
#[derive(Clone)]
pub struct FaultReporter {
    sink: Arc<dyn FaultSink>,
}

impl FaultReporter {
    pub fn new(sink: Arc<dyn FaultSink>) -> Self {
        Self { sink }
    }

    /// Run `task` in the background. An `Err` result is reported as an
    /// unhandled async fault; panics are left to the panic hook.
    pub fn spawn<F, E>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match task.await {
                Ok(()) => debug!(task = name, "Background task finished"),
                Err(e) => {
                    error!(task = name, error = %e, "Background task failed");
                    sink.report(Fault::new(
                        format!("{} failed: {}", name, e),
                        FaultSource::UnhandledAsync,
                    ));
                }
            }
        })
    }
}

/// Report every panic to `sink`, then run the previously installed hook.
pub fn install_panic_hook(sink: Arc<dyn FaultSink>) {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let mut message = panic_message(panic_info.payload());
        if let Some(location) = panic_info.location() {
            message = format!("{} at {}:{}", message, location.file(), location.line());
        }
        sink.report(Fault::new(message, FaultSource::UncaughtFault));
        original_hook(panic_info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        faults: Mutex<Vec<Fault>>,
    }

    impl FaultSink for RecordingSink {
        fn report(&self, fault: Fault) {
            self.faults.lock().push(fault);
        }
    }

    #[tokio::test]
    async fn failed_task_is_reported_as_unhandled_async() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = FaultReporter::new(sink.clone());

        reporter
            .spawn("operator poller", async { Err::<(), _>("token rejected") })
            .await
            .unwrap();

        let faults = sink.faults.lock();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].source, FaultSource::UnhandledAsync);
        assert_eq!(faults[0].message, "operator poller failed: token rejected");
    }

    #[tokio::test]
    async fn finished_task_is_not_reported() {
        let sink = Arc::new(RecordingSink::default());
        let reporter = FaultReporter::new(sink.clone());

        reporter
            .spawn("bridge reader", async { Ok::<(), String>(()) })
            .await
            .unwrap();

        assert!(sink.faults.lock().is_empty());
    }

    #[test]
    fn panic_message_from_str_and_string() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("index out of bounds"));
        assert_eq!(panic_message(boxed.as_ref()), "index out of bounds");

        let boxed: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "panic with non-string payload");
    }
}
