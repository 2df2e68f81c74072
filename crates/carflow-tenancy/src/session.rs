//! # Storage Session Binding
//!
//! [`SessionBinder`] is the seam to the storage layer: binding sets the
//! session-local tenant variable (`app.tenant_id`) that row-level policies
//! key on, unbinding resets it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use carflow_core::TenantId;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::IsolationError;
use crate::scope::IsolationScope;

/// Sets and clears the tenant binding of a storage session.
#[async_trait]
pub trait SessionBinder: Send + Sync + 'static {
    /// Bind `scope.tenant_id()` to the session backing `scope`.
    async fn bind(&self, scope: &IsolationScope) -> Result<(), IsolationError>;

    /// Clear the binding made for `scope`.
    async fn unbind(&self, scope: &IsolationScope) -> Result<(), IsolationError>;
}

/// In-process binder over a modeled connection pool.
///
/// Each bind checks out a pooled connection and sets its tenant variable;
/// each unbind resets the variable and returns the connection. A connection
/// that comes back still carrying a tenant is refused on its next checkout
/// with [`IsolationError::SessionBusy`] and quarantined, which surfaces
/// leaked bindings instead of letting them reach another request.
#[derive(Debug, Default)]
pub struct InMemorySessionBinder {
    pool: Mutex<Pool>,
    binds: AtomicU64,
    unbinds: AtomicU64,
    unavailable: AtomicBool,
}

#[derive(Debug, Default)]
struct Pool {
    /// `app.tenant_id` of every connection, by connection index.
    connections: Vec<Option<TenantId>>,
    /// Connections ready for checkout; the most recently returned is reused
    /// first.
    idle: Vec<usize>,
    /// Connection held by each open scope.
    checked_out: HashMap<Uuid, usize>,
}

impl Pool {
    fn checkout(&mut self) -> usize {
        match self.idle.pop() {
            Some(conn) => conn,
            None => {
                self.connections.push(None);
                self.connections.len() - 1
            }
        }
    }
}

impl InMemorySessionBinder {
    /// Binder with an empty pool; connections are opened on demand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent binds fail, modeling an unreachable store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Tenant currently bound on the connection held by `scope`, if any.
    pub fn bound_tenant(&self, scope: Uuid) -> Option<TenantId> {
        let pool = self.pool.lock();
        let conn = *pool.checked_out.get(&scope)?;
        pool.connections[conn].clone()
    }

    /// Number of scopes currently holding a bound connection.
    pub fn active(&self) -> usize {
        self.pool.lock().checked_out.len()
    }

    /// Connections opened so far, including quarantined ones.
    pub fn connections(&self) -> usize {
        self.pool.lock().connections.len()
    }

    /// Return the connection held by `scope` to the pool without resetting
    /// its tenant variable, as a release path that skips the reset would.
    ///
    /// Returns `false` if `scope` holds no connection.
    pub fn release_without_reset(&self, scope: Uuid) -> bool {
        let mut pool = self.pool.lock();
        match pool.checked_out.remove(&scope) {
            Some(conn) => {
                pool.idle.push(conn);
                true
            }
            None => false,
        }
    }

    /// Successful binds so far.
    pub fn bind_count(&self) -> u64 {
        self.binds.load(Ordering::SeqCst)
    }

    /// Successful unbinds so far.
    pub fn unbind_count(&self) -> u64 {
        self.unbinds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBinder for InMemorySessionBinder {
    async fn bind(&self, scope: &IsolationScope) -> Result<(), IsolationError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IsolationError::Bind {
                tenant: scope.tenant_id().clone(),
                reason: "session store unavailable".into(),
            });
        }
        let mut pool = self.pool.lock();
        if let Some(&conn) = pool.checked_out.get(&scope.id()) {
            let bound = pool.connections[conn].clone().unwrap_or_else(|| scope.tenant_id().clone());
            return Err(IsolationError::SessionBusy {
                scope: scope.id(),
                bound,
            });
        }
        let conn = pool.checkout();
        if let Some(bound) = pool.connections[conn].clone() {
            // Leaked binding: keep the connection out of circulation.
            tracing::error!(
                scope_id = %scope.id(),
                connection = conn,
                bound_tenant = %bound,
                "pooled connection returned with a tenant still bound"
            );
            return Err(IsolationError::SessionBusy {
                scope: scope.id(),
                bound,
            });
        }
        pool.connections[conn] = Some(scope.tenant_id().clone());
        pool.checked_out.insert(scope.id(), conn);
        self.binds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn unbind(&self, scope: &IsolationScope) -> Result<(), IsolationError> {
        let mut pool = self.pool.lock();
        let Some(conn) = pool.checked_out.remove(&scope.id()) else {
            return Err(IsolationError::NotBound { scope: scope.id() });
        };
        pool.connections[conn] = None;
        pool.idle.push(conn);
        self.unbinds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(tenant: &str) -> IsolationScope {
        IsolationScope::new(TenantId::new(tenant).unwrap())
    }

    #[tokio::test]
    async fn bind_then_unbind() {
        let binder = InMemorySessionBinder::new();
        let s = scope("T1");
        binder.bind(&s).await.unwrap();
        assert_eq!(binder.bound_tenant(s.id()).unwrap().as_str(), "T1");
        binder.unbind(&s).await.unwrap();
        assert_eq!(binder.active(), 0);
        assert_eq!(binder.bind_count(), 1);
        assert_eq!(binder.unbind_count(), 1);
    }

    #[tokio::test]
    async fn double_bind_is_a_leak() {
        let binder = InMemorySessionBinder::new();
        let s = scope("T1");
        binder.bind(&s).await.unwrap();
        assert!(matches!(
            binder.bind(&s).await,
            Err(IsolationError::SessionBusy { .. })
        ));
    }

    #[tokio::test]
    async fn unbind_without_bind() {
        let binder = InMemorySessionBinder::new();
        let s = scope("T1");
        assert_eq!(
            binder.unbind(&s).await,
            Err(IsolationError::NotBound { scope: s.id() })
        );
        assert_eq!(binder.unbind_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_refuses_bind() {
        let binder = InMemorySessionBinder::new();
        binder.set_unavailable(true);
        assert!(matches!(
            binder.bind(&scope("T1")).await,
            Err(IsolationError::Bind { .. })
        ));
        assert_eq!(binder.active(), 0);
    }

    #[tokio::test]
    async fn connections_are_reused_after_reset() {
        let binder = InMemorySessionBinder::new();
        for tenant in ["T1", "T2", "T3"] {
            let s = scope(tenant);
            binder.bind(&s).await.unwrap();
            assert_eq!(binder.bound_tenant(s.id()).unwrap().as_str(), tenant);
            binder.unbind(&s).await.unwrap();
        }
        assert_eq!(binder.connections(), 1);
    }

    #[tokio::test]
    async fn leaked_binding_surfaces_on_next_checkout() {
        let binder = InMemorySessionBinder::new();
        let first = scope("T1");
        binder.bind(&first).await.unwrap();
        assert!(binder.release_without_reset(first.id()));

        let second = scope("T2");
        assert_eq!(
            binder.bind(&second).await,
            Err(IsolationError::SessionBusy {
                scope: second.id(),
                bound: TenantId::new("T1").unwrap(),
            })
        );
        assert_eq!(binder.bound_tenant(second.id()), None);

        // The dirty connection is quarantined; a fresh one serves the retry.
        binder.bind(&second).await.unwrap();
        assert_eq!(binder.bound_tenant(second.id()).unwrap().as_str(), "T2");
        assert_eq!(binder.connections(), 2);
    }

    #[tokio::test]
    async fn concurrent_scopes_hold_distinct_connections() {
        let binder = InMemorySessionBinder::new();
        let a = scope("T1");
        let b = scope("T2");
        binder.bind(&a).await.unwrap();
        binder.bind(&b).await.unwrap();
        assert_eq!(binder.bound_tenant(a.id()).unwrap().as_str(), "T1");
        assert_eq!(binder.bound_tenant(b.id()).unwrap().as_str(), "T2");
        assert_eq!(binder.connections(), 2);
    }
}
