use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

// 1. Audit Events

/// AuditEvent
///
/// The facts the lab promises to record server-side: every policy denial on
/// the secure surface and every role grant on either surface. The 403 body
/// stays generic; the caller/target specifics live only in these events.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// A policy denial. The actor is always authenticated (policy only runs
    /// behind authentication).
    AccessDenied {
        actor_id: i64,
        actor_email: String,
        action: &'static str,
        target_id: Option<i64>,
        at: DateTime<Utc>,
    },
    /// A role grant. `actor_id`/`actor_email` are `None` when the grant came
    /// through the unauthenticated vulnerable surface.
    RoleGranted {
        actor_id: Option<i64>,
        actor_email: Option<String>,
        target_user_id: i64,
        role: String,
        at: DateTime<Utc>,
    },
}

// 2. AuditSink Contract

/// AuditSink
///
/// Defines the abstract contract for recording audit events. This trait
/// allows us to swap the concrete implementation (TracingAuditSink in
/// production, MemoryAuditSink in tests) without affecting policy or
/// handlers.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

// 3. The Real Implementation (tracing)

/// TracingAuditSink
///
/// Emits audit events under the `audit` tracing target: denials at WARN,
/// grants at INFO.
#[derive(Clone, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match event {
            AuditEvent::AccessDenied {
                actor_id,
                actor_email,
                action,
                target_id,
                at,
            } => {
                tracing::warn!(
                    target: "audit",
                    actor_id,
                    actor_email = %actor_email,
                    action,
                    target_id = ?target_id,
                    at = %at.to_rfc3339(),
                    "SECURITY ALERT: unauthorized access attempt"
                );
            }
            AuditEvent::RoleGranted {
                actor_id,
                actor_email,
                target_user_id,
                role,
                at,
            } => {
                tracing::info!(
                    target: "audit",
                    actor_id = ?actor_id,
                    actor_email = %actor_email.as_deref().unwrap_or("anonymous"),
                    target_user_id,
                    role = %role,
                    at = %at.to_rfc3339(),
                    "role granted"
                );
            }
        }
    }
}

// 4. The Collecting Implementation (For Tests)

/// MemoryAuditSink
///
/// Collects events behind a mutex so tests can assert exactly what was
/// recorded, in order.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .expect("audit events lock poisoned")
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .expect("audit events lock poisoned")
            .push(event);
    }
}

/// AuditState
///
/// The concrete type used to share the audit sink across the application state.
pub type AuditState = Arc<dyn AuditSink>;
