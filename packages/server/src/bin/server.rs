//! WebSocket fan-out relay server.
//!
//! Every message received from one client is relayed to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000 --echo-sender
//! cargo run --bin hiroba-server -- --queue-capacity 1024 --overflow reject
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hiroba_server::{
    config::{EchoPolicy, OverflowPolicy, QueuePolicy, RelayConfig},
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::Server,
    usecase::RelayHub,
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "WebSocket fan-out relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Also deliver each message back to its sender
    #[arg(long)]
    echo_sender: bool,

    /// Bound the relay queue to this many messages (unbounded if omitted)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// What to do with a message when the bounded queue is full
    #[arg(long, value_enum, default_value_t = OverflowPolicy::Block, requires = "queue_capacity")]
    overflow: OverflowPolicy,

    /// Per-recipient write timeout in milliseconds
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        let echo = if self.echo_sender {
            EchoPolicy::IncludeSender
        } else {
            EchoPolicy::ExcludeSender
        };
        let queue = match self.queue_capacity {
            Some(capacity) => QueuePolicy::Bounded {
                capacity,
                overflow: self.overflow,
            },
            None => QueuePolicy::Unbounded,
        };
        RelayConfig::default()
            .with_echo(echo)
            .with_queue(queue)
            .with_write_timeout(Duration::from_millis(self.write_timeout_ms))
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(&[env!("CARGO_PKG_NAME"), "tower_http"], "debug");

    let args = Args::parse();
    let config = args.relay_config();
    tracing::info!("Relay configuration: {:?}", config);

    // 1. Registry -> 2. RelayHub (spawns the relay loop) -> 3. Server
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let hub = Arc::new(RelayHub::start(config, registry));
    let server = Server::new(hub);

    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
