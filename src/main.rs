use std::net::TcpListener;
use std::sync::Arc;

use bookworm::auth::InMemoryRevocationStore;
use bookworm::catalog::{InMemoryBookStore, InMemoryReviewStore};
use bookworm::configuration::get_configuration;
use bookworm::email_client::Mailer;
use bookworm::startup::run;
use bookworm::telemetry::init_telemetry;
use bookworm::users::InMemoryUserStore;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to read configuration");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "configuration error",
            ));
        }
    };

    let mailer = match Mailer::new(&configuration.mail) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            tracing::error!(error = %e, "failed to build mailer");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "mail configuration error",
            ));
        }
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, "server listening");

    let server = run(
        listener,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryBookStore::new()),
        Arc::new(InMemoryReviewStore::new()),
        Arc::new(InMemoryRevocationStore::new()),
        mailer,
        configuration,
    )?;

    server.await
}
