use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "estransport",
    about = "Probe a search cluster through the estransport connection pool",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Seed URLs (defaults to ELASTICSEARCH_URL, then http://localhost:9200)
    #[arg(short, long, value_delimiter = ',', global = true)]
    pub url: Vec<String>,

    #[arg(long, env = "ELASTICSEARCH_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "ELASTICSEARCH_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Connection selection strategy
    #[arg(long, value_parser = ["round_robin", "random"], default_value = "round_robin", global = true)]
    pub selector: String,

    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Discover cluster nodes once and print the resulting pool")]
    Nodes {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Send a request through the pool")]
    Request {
        #[arg(help = "Request path, e.g. /_cluster/health")]
        path: String,

        #[arg(short = 'X', long, default_value = "GET", help = "HTTP method")]
        method: String,

        #[arg(short, long, help = "JSON request body")]
        data: Option<String>,

        #[arg(long, help = "Single attempt, no retry or failover")]
        no_retry: bool,

        #[arg(long, help = "Run discovery before sending")]
        discover: bool,
    },

    #[command(about = "Run periodic discovery and print pool state until Ctrl-C")]
    Watch {
        #[arg(short, long, default_value = "60", help = "Discovery interval in seconds")]
        interval: u64,

        #[arg(long, default_value = "10", help = "Seconds between pool snapshots")]
        every: u64,
    },
}
