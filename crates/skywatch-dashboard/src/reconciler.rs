//! Alert resolution followed by an authoritative re-fetch of the alert list.

use skywatch_weather::ApiError;

use crate::orchestrator::Dashboard;

impl Dashboard {
    /// Resolve `alert_id` on the backend, then reload the active city's alerts.
    ///
    /// A failed resolve is returned and leaves state untouched. A failed
    /// reload is logged and the current alert list is kept until the next
    /// cycle. The alert list is never edited locally.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the resolve request fails.
    pub async fn resolve_alert(&self, alert_id: &str) -> Result<(), ApiError> {
        let inner = &self.inner;

        if let Err(e) = inner.api.resolve_alert(alert_id).await {
            tracing::error!("Failed to resolve alert {}: {}", alert_id, e);
            return Err(e);
        }

        let ticket = inner.shared.lock().ticket();
        let Some(ticket) = ticket else {
            tracing::debug!("Resolved alert {} while inactive, nothing to reload", alert_id);
            return Ok(());
        };

        match inner.api.alerts(Some(&ticket.city)).await {
            Ok(alerts) => {
                let mut shared = inner.shared.lock();
                if !shared.is_current(&ticket) {
                    tracing::debug!("City changed while reloading alerts, dropping result");
                } else if shared.state.replace_alerts(alerts) {
                    inner.publish(&shared);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Reloading alerts after resolving {} failed, keeping current list: {}",
                    alert_id,
                    e
                );
            }
        }

        Ok(())
    }
}
