//! Command-line surface.

use clap::Parser;

use quotad_core::RateSpec;

#[derive(Parser, Debug)]
#[command(
    name = "quotad",
    about = "Rate-limiting daemon speaking the memcached text protocol"
)]
pub struct Cli {
    /// Rate-limit definition, `<count>/<period>[m|h|d]` (e.g. `5/1m`).
    pub definition: RateSpec,

    /// IP address/host to listen on (repeatable).
    #[arg(short = 's', long = "source")]
    pub source: Vec<String>,

    /// TCP port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = 11211)]
    pub port: u16,

    /// Resolve a `count/period[m|h|d]:` prefix on each incr key into its
    /// own policy.
    #[arg(long)]
    pub dynamic: bool,

    /// Seconds between expiry sweeps of the key table.
    #[arg(long = "cleanup-interval", default_value_t = 30, value_name = "SECONDS")]
    pub cleanup_interval: u64,
}

impl Cli {
    /// Bind hosts, defaulting to localhost when no `-s` was given.
    pub fn sources(&self) -> Vec<String> {
        if self.source.is_empty() {
            vec!["localhost".to_owned()]
        } else {
            self.source.clone()
        }
    }
}
