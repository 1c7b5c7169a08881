//! wsd entry point.

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use wsd::base::NetError;
use wsd::config::{version_line, ClientConfig, Cli};
use wsd::console::{write_connected, write_connecting, StdoutHandle};
use wsd::session::Session;
use wsd::tls::CertificateInspector;
use wsd::ws::WebSocketBuilder;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let argv0 = args.first().cloned().unwrap_or_else(|| "wsd".to_string());

    let cli = match Cli::parse_go_style(args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    if cli.version {
        println!("{}", version_line(&argv0));
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run(cli));
    // A blocked stdin read would otherwise keep the runtime alive.
    runtime.shutdown_background();
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let config = cli.into_config();
    let palette = config.palette;
    let mut out = StdoutHandle;

    if let Err(e) = write_connecting(
        &mut out,
        &palette,
        &config.url,
        config.protocol.as_deref(),
        &config.origin,
    ) {
        tracing::warn!(error = %e, "stdout unavailable");
    }

    let connect = match builder(&config) {
        Ok(builder) => builder.connect().await,
        Err(e) => Err(e),
    };
    let conn = match connect {
        Ok(conn) => conn,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "connect failed");
            let _ = io::stdout().flush();
            eprintln!("error: {e}");
            return 1;
        }
    };

    if let Err(e) = write_connected(&mut out, &palette, &config.url) {
        tracing::warn!(error = %e, "stdout unavailable");
    }

    let (sink, source) = conn.split();
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for interrupt");
            std::future::pending::<()>().await;
        }
    };

    let end = Session::new(&config)
        .run(
            sink,
            source,
            BufReader::new(tokio::io::stdin()),
            out,
            interrupt,
        )
        .await;
    end.exit_code()
}

fn builder(config: &ClientConfig) -> Result<WebSocketBuilder, NetError> {
    Ok(WebSocketBuilder::new()
        .url(&config.url)?
        .origin(&config.origin)?
        .subprotocol(config.protocol.as_deref().unwrap_or_default())?
        .insecure_skip_verify(config.insecure_skip_verify)
        .verifier(Arc::new(CertificateInspector::new(config.palette))))
}
