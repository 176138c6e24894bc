//! TCP accept loop and lifecycle. One spawned task per client; a watch
//! channel fans the shutdown signal out to the accept loop, and the
//! manager's notify handles reach into individual connections.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, TcpKeepalive, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{error, info, warn};

use common::err::CoreError;
use common::server::Server;

use crate::context::ServerContext;
use crate::conn::Connection;
use crate::error::{SResult, ServerError};
use crate::manager::ConnectionManager;
use crate::packet::err_packet::ErrPacket;
use crate::packet::PacketWriter;

pub struct CyscaleServer {
    ctx: ServerContext,
    manager: Arc<ConnectionManager>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl CyscaleServer {
    pub fn new(ctx: ServerContext) -> Self {
        let manager = Arc::new(ConnectionManager::new(Arc::clone(&ctx.config)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        CyscaleServer {
            ctx,
            manager,
            listener: None,
            local_addr: None,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn manager(&self) -> Arc<ConnectionManager> {
        Arc::clone(&self.manager)
    }

    /// Bound address, available after `bind` (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn shutdown_sender(&self) -> Arc<watch::Sender<bool>> {
        Arc::clone(&self.shutdown_tx)
    }

    /// Bind with the configured socket options.
    pub fn bind(&mut self) -> SResult<()> {
        let config = &self.ctx.config;
        let addr: SocketAddr = config
            .listen_addr()
            .parse()
            .map_err(|e| ServerError::Protocol(format!("bad bind address: {}", e)))?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(config.reuse_address)?;
        socket.set_recv_buffer_size(config.receive_buffer_size)?;
        socket.set_send_buffer_size(config.send_buffer_size)?;
        if config.tcp_keep_alive {
            let keepalive = TcpKeepalive::new()
                .with_time(Duration::from_secs(config.tcp_keep_alive_time_secs))
                .with_interval(Duration::from_secs(config.tcp_keep_alive_interval_secs))
                .with_retries(config.tcp_keep_alive_retry_count);
            socket.set_tcp_keepalive(&keepalive)?;
        }
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(config.backlog as i32)?;

        let listener = TcpListener::from_std(socket.into())?;
        self.local_addr = Some(listener.local_addr()?);
        self.listener = Some(listener);

        info!("listening on {}", self.local_addr.unwrap());
        Ok(())
    }

    async fn accept_loop(&mut self) -> SResult<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| ServerError::Protocol("server is not bound".to_string()))?;
        let mut shutdown_rx = self.shutdown_rx.clone();

        // idle sweeper
        let sweeper_manager = Arc::clone(&self.manager);
        let sweep_interval = self.ctx.config.health_check_interval();
        let mut sweeper_shutdown = self.shutdown_rx.clone();
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweeper_manager.sweep_idle();
                    }
                    _ = sweeper_shutdown.changed() => return,
                }
            }
        });

        loop {
            let (stream, peer) = tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("accept loop stopping");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("accept error: {}", e);
                        continue;
                    }
                },
            };

            if let Err(e) = stream.set_nodelay(self.ctx.config.tcp_no_delay) {
                warn!("set_nodelay failed for {}: {}", peer, e);
            }

            let handle = match self.manager.try_register(&peer.to_string()) {
                Some(handle) => handle,
                None => {
                    refuse_connection(stream).await;
                    continue;
                }
            };

            let ctx = self.ctx.clone();
            let manager = Arc::clone(&self.manager);
            tokio::spawn(async move {
                let id = handle.id;
                let mut connection =
                    Connection::new(stream, ctx, id, &handle.remote, handle.close_signal.clone())
                        .with_activity_clock(handle.activity_clock.clone());
                if let Err(e) = connection.run().await {
                    warn!("connection {} closed with error: {}", id, e);
                }
                manager.deregister(id);
            });
        }

        sweeper.abort();
        Ok(())
    }

    async fn drain(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.manager.connection_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.manager.connection_count() > 0 {
            warn!(
                "drain window elapsed with {} connections, closing",
                self.manager.connection_count()
            );
            self.manager.close_all();
        }
    }
}

/// Over-cap clients get the error before the socket closes.
async fn refuse_connection(stream: TcpStream) {
    let err = ServerError::TooManyConnections;
    warn!("{}", err);

    let (_, write_half) = tokio::io::split(stream);
    let mut writer = PacketWriter::new(write_half);
    if let Ok(payload) = ErrPacket::from_error(&err).serialize() {
        let _ = writer.write_packet(&payload).await;
    }
    let _ = writer.shutdown().await;
}

#[async_trait::async_trait]
impl Server for CyscaleServer {
    async fn start(&mut self) -> Result<(), CoreError> {
        if self.listener.is_none() {
            self.bind()
                .map_err(|e| CoreError::ConfigError(e.to_string()))?;
        }
        self.accept_loop()
            .await
            .map_err(|e| CoreError::ConfigError(e.to_string()))
    }

    async fn shutdown(&mut self, graceful: bool) -> Result<(), CoreError> {
        let _ = self.shutdown_tx.send(true);
        if graceful {
            self.drain(self.ctx.config.graceful_shutdown_timeout()).await;
        } else {
            self.manager.close_all();
        }
        info!("server shut down");
        Ok(())
    }
}
