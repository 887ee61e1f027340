use crate::RestError;
use async_trait::async_trait;
use axum::{Router, routing::get};
use config_loader::rest::RestConfig;
use logger::{debug, info, warn};
use std::{future::IntoFuture, io, net::SocketAddr};
use task_runner::{PhaseResult, ShutdownSignal, Task};
use tokio::{
    net::TcpListener,
    sync::watch,
    task::{JoinError, JoinHandle},
    time,
};

/// Where the listener ended up bound, as seen by route builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindScope {
    /// Only reachable from this host; internal routes may be exposed.
    Loopback,
    External,
}

impl BindScope {
    pub fn of(addr: &SocketAddr) -> Self {
        if addr.ip().is_loopback() {
            BindScope::Loopback
        } else {
            BindScope::External
        }
    }

    pub fn is_loopback(self) -> bool {
        self == BindScope::Loopback
    }
}

type RouteBuilder = Box<dyn Fn(Router, BindScope) -> Router + Send + Sync>;

struct Prepared {
    listener: TcpListener,
    router: Router,
}

struct Serving {
    drain: ShutdownSignal,
    handle: JoinHandle<io::Result<()>>,
}

pub struct RestTask {
    config: RestConfig,
    routes: RouteBuilder,
    addr_tx: watch::Sender<Option<SocketAddr>>,
    prepared: Option<Prepared>,
    serving: Option<Serving>,
}

impl RestTask {
    /// Task serving `GET /health` only. Add routes with [`with_routes`](Self::with_routes).
    pub fn new(config: RestConfig) -> Self {
        let (addr_tx, _) = watch::channel(None);
        Self {
            config,
            routes: Box::new(|router, _| router),
            addr_tx,
            prepared: None,
            serving: None,
        }
    }

    /// Extend the router at init time. The builder is told whether the listener is bound
    /// to loopback so it can decide on internal-only routes.
    pub fn with_routes<F>(mut self, routes: F) -> Self
    where
        F: Fn(Router, BindScope) -> Router + Send + Sync + 'static,
    {
        self.routes = Box::new(routes);
        self
    }

    /// Bound address: `Some` once init has bound the listener, back to `None` once it closed.
    pub fn local_addr(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.addr_tx.subscribe()
    }

    async fn drain(&mut self) -> Result<(), RestError> {
        if self.prepared.take().is_some() {
            debug!("releasing REST listener that never served");
            self.addr_tx.send_replace(None);
        }

        let Some(Serving { drain, mut handle }) = self.serving.take() else {
            return Ok(());
        };

        let timeout = self.config.drain_timeout();
        info!(?timeout, "REST service draining connections");
        drain.trigger();

        let result = match time::timeout(timeout, &mut handle).await {
            Ok(joined) => server_outcome(joined),
            Err(_) => {
                handle.abort();
                warn!(?timeout, "REST drain timed out, listener closed");
                Err(RestError::DrainTimeout { timeout })
            }
        };
        self.addr_tx.send_replace(None);
        result
    }
}

#[async_trait]
impl Task for RestTask {
    async fn init(&mut self) -> PhaseResult {
        let addr = self.config.listen_addr.as_str();
        let bind_error = |source| RestError::Bind {
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local = listener.local_addr().map_err(bind_error)?;
        let scope = BindScope::of(&local);

        let router = (self.routes)(Router::new().route("/health", get(health)), scope);
        info!(addr = %local, ?scope, "REST listening address");

        self.prepared = Some(Prepared { listener, router });
        self.addr_tx.send_replace(Some(local));
        Ok(())
    }

    async fn run(&mut self, shutdown: &ShutdownSignal) -> PhaseResult {
        let Prepared { listener, router } = self.prepared.take().ok_or(RestError::NotInitialized)?;

        let drain = ShutdownSignal::new();
        let mut handle = tokio::spawn(
            axum::serve(listener, router)
                .with_graceful_shutdown(drain.wait_owned())
                .into_future(),
        );
        info!("REST service is serving");

        tokio::select! {
            joined = &mut handle => {
                self.addr_tx.send_replace(None);
                return server_outcome(joined).map_err(Into::into);
            }
            _ = shutdown.wait() => {}
        }

        self.serving = Some(Serving { drain, handle });
        self.drain().await.map_err(Into::into)
    }

    async fn shutdown(&mut self) -> PhaseResult {
        self.drain().await.map_err(Into::into)
    }
}

async fn health() -> &'static str {
    "ok"
}

fn server_outcome(joined: Result<io::Result<()>, JoinError>) -> Result<(), RestError> {
    match joined {
        Ok(Ok(())) => {
            info!("REST service stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(RestError::Serve(e)),
        Err(e) => Err(RestError::Join(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_scope() {
        let cases = [
            ("127.0.0.1:7468", BindScope::Loopback),
            ("[::1]:7468", BindScope::Loopback),
            ("0.0.0.0:7468", BindScope::External),
            ("10.1.2.3:80", BindScope::External),
        ];
        for (addr, expected) in cases {
            let addr: SocketAddr = addr.parse().unwrap();
            assert_eq!(BindScope::of(&addr), expected, "{addr}");
        }
        assert!(BindScope::Loopback.is_loopback());
    }

    #[tokio::test]
    async fn test_run_before_init_is_error() {
        let mut task = RestTask::new(RestConfig::new("127.0.0.1:0"));
        let err = task.run(&ShutdownSignal::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RestError>(),
            Some(RestError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_without_init_is_noop() {
        let mut task = RestTask::new(RestConfig::default());
        assert!(task.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_after_init_releases_listener() {
        let mut task = RestTask::new(RestConfig::new("127.0.0.1:0"));
        let addr_rx = task.local_addr();

        task.init().await.unwrap();
        let addr = (*addr_rx.borrow()).unwrap();

        task.shutdown().await.unwrap();
        assert!(addr_rx.borrow().is_none());
        assert!(TcpListener::bind(addr).await.is_ok());
    }
}
