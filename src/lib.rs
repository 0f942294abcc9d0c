//! The `sleeper` command line: a test server that answers `/sleep/<ms>`
//! after waiting `<ms>` milliseconds.

use anyhow::Result;
use clap::Parser;
use sleeper_trigger_http::{CliArgs, HttpTrigger};

/// The version of the sleeper CLI.
pub const SLEEPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level command line parser.
#[derive(Parser, Debug)]
#[clap(
    name = "sleeper",
    version = SLEEPER_VERSION,
    about = "HTTP test server that responds to /sleep/<ms> after sleeping <ms> milliseconds"
)]
pub struct SleeperApp {
    #[clap(flatten)]
    pub http: CliArgs,
}

impl SleeperApp {
    /// Binds the listener and serves until the process is killed or the
    /// accept loop fails.
    pub async fn run(self) -> Result<()> {
        HttpTrigger::new(self.http).run().await
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        SleeperApp::command().debug_assert();
    }

    #[test]
    fn listen_defaults_to_all_interfaces_on_8086() {
        let app = SleeperApp::try_parse_from(["sleeper"]).unwrap();
        assert_eq!(
            app.http.address,
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8086))
        );
    }

    #[test]
    fn listen_accepts_short_and_long_flags() {
        let app = SleeperApp::try_parse_from(["sleeper", "-l", "127.0.0.1:9000"]).unwrap();
        assert_eq!(app.http.address, "127.0.0.1:9000".parse().unwrap());

        let app = SleeperApp::try_parse_from(["sleeper", "--listen", ":9001"]).unwrap();
        assert_eq!(
            app.http.address,
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9001))
        );
    }

    #[test]
    fn unresolvable_listen_address_is_a_usage_error() {
        let err = SleeperApp::try_parse_from(["sleeper", "-l", "not an address"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
