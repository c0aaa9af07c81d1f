//! Server implementation

#![warn(missing_docs)]

mod http;

use std::path::PathBuf;
use std::thread;

use berth_core::{Config, RequestHandler};
use eyre::{eyre, Result, WrapErr};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the berth reservation system
    config: Config,

    /// Port for the HTTP server to listen on
    port: u16,
    /// Host for the HTTP server to listen on
    host: String,
    /// Number of request threads
    threads: u32,
}

impl Opts {
    fn from_args() -> Result<Self> {
        let mut opts = Opts {
            port: 8000,
            host: String::from("127.0.0.1"),
            config: Config::default(),
            threads: 8,
        };

        // Flags given on the command line win over the config file, whatever
        // their position.
        let mut config_file: Option<PathBuf> = None;
        let mut overrides = Overrides::default();

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option.take() {
                match opt.as_str() {
                    "-port" => opts.port = arg.parse().wrap_err("-port takes a decimal u16")?,
                    "-host" => opts.host = arg,
                    "-threads" => {
                        opts.threads = arg.parse().wrap_err("-threads takes a decimal u32")?
                    }
                    "-config" => config_file = Some(PathBuf::from(arg)),
                    "-seed" => {
                        overrides.seed = Some(arg.parse().wrap_err("-seed takes a decimal u64")?)
                    }
                    "-lock-timeout" => {
                        overrides.lock_timeout_ms =
                            Some(arg.parse().wrap_err("-lock-timeout takes milliseconds")?)
                    }
                    _ => return Err(eyre!("unknown option {opt}")),
                }
            } else {
                match arg.as_str() {
                    "-no-restamp" => overrides.no_restamp = true,
                    "-children-hold-confirmed" => overrides.children_hold_confirmed = true,
                    _ => option = Some(arg),
                }
            }
        }
        if let Some(opt) = option {
            return Err(eyre!("leftover option {opt}"));
        }

        if let Some(path) = config_file {
            let contents = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("could not read {}", path.display()))?;
            opts.config = toml::from_str(&contents)
                .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
        }
        overrides.apply(&mut opts.config);

        if opts.threads == 0 {
            return Err(eyre!("-threads must be at least 1"));
        }
        Ok(opts)
    }
}

/// Configuration flags collected while parsing the command line
#[derive(Debug, Default)]
struct Overrides {
    seed: Option<u64>,
    lock_timeout_ms: Option<u64>,
    no_restamp: bool,
    children_hold_confirmed: bool,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.lock_timeout_ms {
            config.lock_timeout_ms = ms;
        }
        if self.no_restamp {
            config.restamp_on_promotion = false;
        }
        if self.children_hold_confirmed {
            config.children_hold_confirmed = true;
        }
    }
}

fn http_loop<H: RequestHandler>(server: &tiny_http::Server, handler: &H) {
    loop {
        match server.recv() {
            Ok(rq) => {
                if let Some(rq) = http::parse(rq) {
                    handler.handle(rq);
                }
            }
            Err(err) => {
                error!(%err, "HTTP receive failed");
                return;
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("berth_engine=info,berth_server=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let opts = Opts::from_args()?;
    info!(host = %opts.host, port = opts.port, threads = opts.threads, "starting berth server");

    let server = tiny_http::Server::http((opts.host.as_str(), opts.port))
        .map_err(|err| eyre!("could not bind {}:{}: {err}", opts.host, opts.port))?;
    let office = berth_engine::launch(&opts.config);

    thread::scope(|s| -> Result<()> {
        for i in 0..opts.threads {
            thread::Builder::new()
                .name(format!("http_{i}"))
                .spawn_scoped(s, || http_loop(&server, &office))?;
        }
        Ok(())
    })?;

    office.shutdown();
    Ok(())
}
