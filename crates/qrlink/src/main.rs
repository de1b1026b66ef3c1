use pingora::server::Server;
use pingora::services::listening::Service;
use qrlink::config::ServiceConfig;
use qrlink::{Components, build_app};
use qrlink_web::App;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

fn main() {
    // INFO by default, overridable through RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(2);
        }
    };

    let app = build_app(&config, Components::default());

    tracing::info!(
        listen = %config.listen,
        base_url = %config.base_url,
        "starting qrlink"
    );
    if let Err(err) = run_server(app, &config) {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
}

fn run_server(app: App, config: &ServiceConfig) -> std::io::Result<()> {
    let mut server = Server::new(None).map_err(|e| std::io::Error::other(e.to_string()))?;
    server.bootstrap();

    let mut service = app.to_service("qrlink HTTP");
    service.add_tcp(&config.listen);
    server.add_service(service);

    if let Some(addr) = &config.metrics_listen {
        let mut metrics = Service::prometheus_http_service();
        metrics.add_tcp(addr);
        server.add_service(metrics);
        tracing::info!(listen = %addr, "serving Prometheus metrics");
    }

    server.run_forever()
}
