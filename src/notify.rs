//! Notify
//!
//! The single side effect used to alert people about a rejected or failed job.
use crate::gate::Comparison;
use log::warn;
use std::sync::Mutex;

/// Extra information attached to an alert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertContext {
    pub comparison: Option<Comparison>,
    pub stage: Option<String>,
}

/// Where alerts go. Delivery is fire-and-forget, failures must not surface to the job.
pub trait Notifier {
    fn notify(&self, message: &str, context: &AlertContext);
}

/// Writes alerts to the log as a warning banner.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, context: &AlertContext) {
        let rule = "=".repeat(50);
        warn!("{}", rule);
        warn!("ALERT: {}", message);
        if let Some(stage) = context.stage.as_ref() {
            warn!("  Stage:         {}", stage);
        }
        if let Some(c) = context.comparison.as_ref() {
            warn!("  Current F1:    {:.4}", c.baseline());
            warn!("  Candidate F1:  {:.4}", c.candidate);
            warn!("  Drop:          {:.4}", c.drop());
        }
        warn!("{}", rule);
    }
}

/// Keeps alerts in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    alerts: Mutex<Vec<(String, AlertContext)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(String, AlertContext)> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str, context: &AlertContext) {
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push((message.to_string(), context.clone()));
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, context: &AlertContext) {
        (**self).notify(message, context)
    }
}
