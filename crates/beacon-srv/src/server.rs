//! The beacon server runtime.
//!
//! Owns the UDP socket, the interface registry and the beacon store, and runs
//! the receive loop plus three periodic tasks: keepalives, keepalive-timeout
//! sweeps and beacon propagation.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use beacon_control::{ExpirySweeper, HopFieldExtender, Interfaces, Propagator, spawn_periodic};

use crate::config::ServerConfig;
use crate::error::{HandlerError, ServerError};
use crate::handler::InboundHandler;
use crate::keepalive::KeepaliveEmitter;
use crate::onehop::UdpSender;
use crate::store::BeaconStore;
use crate::topology;

/// Largest datagram the receive loop accepts.
const MAX_DATAGRAM: usize = 65_535;

/// Cloneable handle that stops a running [`Server`].
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct Server {
    config: ServerConfig,
    intfs: Arc<Interfaces>,
    store: Arc<BeaconStore>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Server {
    /// Load the topology and policy referenced by `config`.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        if config.beaconing.propagation_interval_ms == 0
            || config.beaconing.expiry_sweep_interval_ms == 0
        {
            return Err(ServerError::Config(
                "task intervals must be greater than zero".into(),
            ));
        }
        let infos = topology::load(&config.general.topology)?;
        let policy = config.load_policy()?;
        info!(
            "loaded {} interfaces, policy: best {} of {} candidates, max {} hops",
            infos.len(),
            policy.best_set_size,
            policy.candidate_set_size,
            policy.filter.max_hops_length
        );
        let intfs = Arc::new(Interfaces::new(infos, config.ifstate_config()));
        let store = Arc::new(BeaconStore::new(policy));
        let (stop_tx, stop_rx) = watch::channel(false);

        Ok(Self {
            config,
            intfs,
            store,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
            handles: Vec::new(),
            local_addr: None,
        })
    }

    pub fn interfaces(&self) -> &Arc<Interfaces> {
        &self.intfs
    }

    pub fn store(&self) -> &Arc<BeaconStore> {
        &self.store
    }

    /// Bound address once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Bind the socket and spawn all tasks. Returns the bound address.
    ///
    /// All interfaces are reset to `Inactive` first, as this instance starts a
    /// fresh term as the AS's beacon server.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.local_addr.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        let local_ia = self.config.general.ia;
        let extender = HopFieldExtender::new(
            self.config.extender_config()?,
            Arc::clone(&self.intfs),
        )?;

        let listen = self.config.general.listen;
        let socket = UdpSocket::bind(listen)
            .await
            .map_err(|source| ServerError::Bind {
                addr: listen,
                source,
            })?;
        let local_addr = socket.local_addr()?;
        let socket = Arc::new(socket);
        let sender = Arc::new(UdpSender::new(Arc::clone(&socket)));

        let propagator = Propagator::new(
            self.config.propagator_config(),
            Arc::clone(&self.intfs),
            Arc::clone(&self.store),
            Arc::new(extender),
            Arc::clone(&sender),
        )?;

        self.intfs.reset();
        info!("beacon server for {local_ia} listening on {local_addr}");

        let handler = InboundHandler::new(local_ia, Arc::clone(&self.intfs), Arc::clone(&self.store));
        self.handles.push(tokio::spawn(recv_loop(
            socket,
            handler,
            self.stop_rx.clone(),
        )));

        let beaconing = &self.config.beaconing;
        self.handles.push(spawn_periodic(
            Arc::new(KeepaliveEmitter::new(
                local_ia,
                Arc::clone(&self.intfs),
                sender,
            )),
            self.intfs.config().keepalive_interval,
            self.stop_rx.clone(),
        ));
        self.handles.push(spawn_periodic(
            Arc::new(ExpirySweeper::new(Arc::clone(&self.intfs))),
            beaconing.expiry_sweep_interval(),
            self.stop_rx.clone(),
        ));
        self.handles.push(spawn_periodic(
            Arc::new(propagator),
            beaconing.propagation_interval(),
            self.stop_rx.clone(),
        ));

        #[cfg(unix)]
        self.handles.push(spawn_reload_on_hangup(
            self.config.general.topology.clone(),
            Arc::clone(&self.intfs),
            self.stop_rx.clone(),
        )?);

        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Reload the topology file into the interface registry.
    pub fn reload_topology(&self) -> Result<usize, ServerError> {
        let infos = topology::load(&self.config.general.topology)?;
        let count = infos.len();
        self.intfs.update(infos);
        info!("reloaded topology: {count} interfaces");
        Ok(count)
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        let mut stop_rx = self.stop_rx.clone();
        while !*stop_rx.borrow_and_update() {
            if stop_rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Signal the server to shut down.
    pub fn trigger_shutdown(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop all tasks and wait for them to finish.
    pub async fn shutdown(mut self) {
        info!("shutting down beacon server");
        self.trigger_shutdown();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!("task ended abnormally: {e}");
            }
        }
        info!("beacon server shutdown complete");
    }
}

async fn recv_loop(
    socket: Arc<UdpSocket>,
    handler: InboundHandler,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => {
                debug!("receive loop shutting down");
                break;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((n, from)) => match handler.handle(&buf[..n], from) {
                        Ok(handled) => debug!("handled frame from {from}: {handled:?}"),
                        Err(err @ HandlerError::IfState(_)) => {
                            warn!("dropped frame from {from}: {err}");
                        }
                        Err(err) => debug!("dropped frame from {from}: {err}"),
                    },
                    Err(e) => warn!("receive error: {e}"),
                }
            }
        }
    }
}

#[cfg(unix)]
fn spawn_reload_on_hangup(
    path: std::path::PathBuf,
    intfs: Arc<Interfaces>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<JoinHandle<()>, ServerError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop_rx.changed() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    match topology::load(&path) {
                        Ok(infos) => {
                            info!("SIGHUP: reloaded topology with {} interfaces", infos.len());
                            intfs.update(infos);
                        }
                        Err(e) => error!("SIGHUP: unable to reload topology: {e}"),
                    }
                }
            }
        }
    }))
}
