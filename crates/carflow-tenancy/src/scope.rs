//! # Isolation Scope Manager
//!
//! Runs a future inside a tenant-bound storage session. The binding is
//! released exactly once whether the future returns, panics, or is dropped
//! before completion.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use carflow_core::TenantId;
use futures::FutureExt;
use uuid::Uuid;

use crate::error::IsolationError;
use crate::session::SessionBinder;

/// One tenant binding for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsolationScope {
    id: Uuid,
    tenant_id: TenantId,
}

impl IsolationScope {
    /// A fresh scope with a unique id.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
        }
    }

    /// Correlation id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bound tenant.
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }
}

/// Opens and closes isolation scopes through a [`SessionBinder`].
#[derive(Clone)]
pub struct ScopeManager {
    binder: Arc<dyn SessionBinder>,
}

impl std::fmt::Debug for ScopeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeManager").finish_non_exhaustive()
    }
}

impl ScopeManager {
    /// Manager over `binder`.
    pub fn new(binder: Arc<dyn SessionBinder>) -> Self {
        Self { binder }
    }

    /// Bind `tenant`, run the future built by `f`, then unbind.
    ///
    /// `f` receives the open scope so the caller can expose it to the
    /// handler. A panic in the future is re-raised after the unbind. If the
    /// returned future is dropped mid-flight, including while the bind is
    /// still pending, the unbind is spawned on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the binder's [`IsolationError`] when the bind fails; the
    /// future is then never polled. Unbind failures are logged, not
    /// returned, since the future's output already exists.
    pub async fn with_scope<F, Fut, T>(&self, tenant: TenantId, f: F) -> Result<T, IsolationError>
    where
        F: FnOnce(IsolationScope) -> Fut,
        Fut: Future<Output = T>,
    {
        let scope = IsolationScope::new(tenant);

        // Armed before the bind is awaited: if this future is dropped while
        // the bind is in flight, the binding may already be set.
        let mut guard = ScopeGuard {
            binder: Arc::clone(&self.binder),
            scope: Some(scope.clone()),
        };
        if let Err(err) = self.binder.bind(&scope).await {
            guard.disarm();
            return Err(err);
        }
        tracing::debug!(
            scope_id = %scope.id(),
            tenant_id = %scope.tenant_id(),
            "isolation scope opened"
        );

        let outcome = AssertUnwindSafe(f(scope)).catch_unwind().await;
        guard.close().await;

        match outcome {
            Ok(value) => Ok(value),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

struct ScopeGuard {
    binder: Arc<dyn SessionBinder>,
    scope: Option<IsolationScope>,
}

impl ScopeGuard {
    fn disarm(&mut self) {
        self.scope = None;
    }

    async fn close(&mut self) {
        if let Some(scope) = self.scope.as_ref() {
            release(self.binder.as_ref(), scope).await;
        }
        self.scope = None;
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let Some(scope) = self.scope.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let binder = Arc::clone(&self.binder);
                handle.spawn(async move {
                    release(binder.as_ref(), &scope).await;
                });
            }
            Err(_) => tracing::error!(
                scope_id = %scope.id(),
                tenant_id = %scope.tenant_id(),
                "isolation scope dropped outside a runtime; binding not released"
            ),
        }
    }
}

async fn release(binder: &dyn SessionBinder, scope: &IsolationScope) {
    match binder.unbind(scope).await {
        Ok(()) => tracing::debug!(scope_id = %scope.id(), "isolation scope closed"),
        // Cancelled before the bind took effect.
        Err(IsolationError::NotBound { .. }) => {
            tracing::debug!(scope_id = %scope.id(), "isolation scope was never bound")
        }
        Err(err) => tracing::error!(
            scope_id = %scope.id(),
            tenant_id = %scope.tenant_id(),
            error = %err,
            "failed to release isolation scope"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionBinder;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Binder whose bind takes effect, then suspends before returning.
    struct SlowBinder(Arc<InMemorySessionBinder>);

    #[async_trait]
    impl SessionBinder for SlowBinder {
        async fn bind(&self, scope: &IsolationScope) -> Result<(), IsolationError> {
            self.0.bind(scope).await?;
            tokio::task::yield_now().await;
            Ok(())
        }

        async fn unbind(&self, scope: &IsolationScope) -> Result<(), IsolationError> {
            self.0.unbind(scope).await
        }
    }

    async fn settle(binder: &InMemorySessionBinder) {
        for _ in 0..20 {
            if binder.active() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    fn setup() -> (Arc<InMemorySessionBinder>, ScopeManager) {
        let binder = Arc::new(InMemorySessionBinder::new());
        let manager = ScopeManager::new(binder.clone());
        (binder, manager)
    }

    fn tid(s: &str) -> TenantId {
        TenantId::new(s).unwrap()
    }

    #[tokio::test]
    async fn scope_is_bound_while_future_runs() {
        let (binder, manager) = setup();
        let observer = binder.clone();
        let seen = manager
            .with_scope(tid("T1"), |scope| async move {
                observer.bound_tenant(scope.id()).map(|t| t.as_str().to_string())
            })
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("T1"));
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.unbind_count(), 1);
    }

    #[tokio::test]
    async fn scope_closes_on_error_output() {
        let (binder, manager) = setup();
        let out: Result<(), &str> = manager
            .with_scope(tid("T1"), |_| async { Err("handler failed") })
            .await
            .unwrap();
        assert_eq!(out, Err("handler failed"));
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.bind_count(), binder.unbind_count());
    }

    #[tokio::test]
    async fn scope_closes_on_panic_and_panic_propagates() {
        let (binder, manager) = setup();
        let task = tokio::spawn(async move {
            manager
                .with_scope(tid("T1"), |_| async {
                    panic!("handler blew up");
                })
                .await
        });
        let err = task.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.unbind_count(), 1);
    }

    #[tokio::test]
    async fn scope_closes_on_cancellation() {
        let (binder, manager) = setup();
        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            manager.with_scope(tid("T1"), |_| std::future::pending::<()>()),
        )
        .await;
        assert!(timed_out.is_err());

        // The unbind runs on a spawned task.
        settle(&binder).await;
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.bind_count(), 1);
        assert_eq!(binder.unbind_count(), 1);
    }

    #[tokio::test]
    async fn scope_closes_when_cancelled_during_bind() {
        let inner = Arc::new(InMemorySessionBinder::new());
        let manager = ScopeManager::new(Arc::new(SlowBinder(inner.clone())));

        let mut pending = Box::pin(manager.with_scope(tid("T1"), |_| async {}));
        assert!(pending.as_mut().now_or_never().is_none());
        assert_eq!(inner.active(), 1);
        drop(pending);

        settle(&inner).await;
        assert_eq!(inner.active(), 0);
        assert_eq!(inner.bind_count(), 1);
        assert_eq!(inner.unbind_count(), 1);
    }

    #[tokio::test]
    async fn failed_bind_schedules_no_release() {
        let inner = Arc::new(InMemorySessionBinder::new());
        let manager = ScopeManager::new(Arc::new(SlowBinder(inner.clone())));
        inner.set_unavailable(true);

        let mut pending = Box::pin(manager.with_scope(tid("T1"), |_| async {}));
        let result = pending.as_mut().now_or_never();
        assert!(matches!(result, Some(Err(IsolationError::Bind { .. }))));
        drop(pending);

        tokio::task::yield_now().await;
        assert_eq!(inner.bind_count(), 0);
        assert_eq!(inner.unbind_count(), 0);
    }

    #[tokio::test]
    async fn bind_failure_never_runs_the_future() {
        let (binder, manager) = setup();
        binder.set_unavailable(true);
        let mut ran = false;
        let result = manager
            .with_scope(tid("T1"), |_| {
                ran = true;
                async {}
            })
            .await;
        assert!(matches!(result, Err(IsolationError::Bind { .. })));
        assert!(!ran);
        assert_eq!(binder.unbind_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_scopes_do_not_share_sessions() {
        let (binder, manager) = setup();
        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            let observer = binder.clone();
            handles.push(tokio::spawn(async move {
                let tenant = tid(&format!("T{i}"));
                manager
                    .with_scope(tenant.clone(), |scope| async move {
                        tokio::task::yield_now().await;
                        assert_eq!(observer.bound_tenant(scope.id()), Some(tenant));
                    })
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.bind_count(), 16);
        assert_eq!(binder.unbind_count(), 16);
    }

    #[test]
    fn scope_ids_are_unique() {
        let a = IsolationScope::new(tid("T1"));
        let b = IsolationScope::new(tid("T1"));
        assert_ne!(a.id(), b.id());
    }
}
