//! Status alerts: payload construction, webhook transport and per-sink fan-out.

pub mod fanout;
pub mod payload;
pub mod webhook;

pub use fanout::{Delivery, FanoutReport, NotificationFanout};
pub use payload::{AlertKind, AlertPayload};
pub use webhook::{DeliveryError, Notifier, WebhookNotifier};
