//! Implementation for the sleeper HTTP listener.

mod instrument;
mod server;

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;

pub use server::HttpServer;

/// The address used when `--listen` is not given.
pub const DEFAULT_LISTEN_ADDR: &str = ":8086";

#[derive(Args, Debug)]
pub struct CliArgs {
    /// Listen address; an empty host (e.g. ":8086") listens on all interfaces
    #[clap(short = 'l', long = "listen", default_value = DEFAULT_LISTEN_ADDR, value_parser = parse_listen_addr)]
    pub address: SocketAddr,
}

/// The sleeper HTTP trigger.
pub struct HttpTrigger {
    listen_addr: SocketAddr,
}

impl HttpTrigger {
    pub fn new(cli_args: CliArgs) -> Self {
        Self {
            listen_addr: cli_args.address,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Binds the listen address and serves until the accept loop fails.
    ///
    /// A bind failure is returned immediately and is never retried.
    pub async fn run(self) -> anyhow::Result<()> {
        let listen_addr = self.listen_addr;
        let listener = TcpListener::bind(listen_addr)
            .await
            .with_context(|| format!("Unable to listen on {listen_addr}"))?;

        HttpServer::new().serve(listener).await
    }
}

fn parse_listen_addr(addr: &str) -> anyhow::Result<SocketAddr> {
    // An empty host means every interface, as in ":8086".
    if let Some(port) = addr.strip_prefix(':') {
        let port = port
            .parse::<u16>()
            .with_context(|| format!("invalid port in listen address '{addr}'"))?;
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }

    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    // Prefer 127.0.0.1 over e.g. [::1] when a name resolves to both
    if let Some(addr) = addrs
        .iter()
        .find(|addr| addr.is_ipv4() && addr.ip() == Ipv4Addr::LOCALHOST)
    {
        return Ok(*addr);
    }
    // Otherwise, take the first addr (OS preference)
    addrs.into_iter().next().context("couldn't resolve address")
}
