use crate::config::Config;
use crate::errors::GatewayError;
use crate::managers::email::EmailManager;
use crate::managers::forms::FormsManager;
use crate::managers::netlify::NetlifyManager;
use crate::managers::openapi::OpenApiManager;
use crate::managers::proxy::ProxyManager;
use crate::services::form_store::FormStore;
use crate::services::http_client::build_client;
use crate::services::logger::Logger;
use crate::services::validation::Validation;
use std::sync::Arc;

/// Shared state behind every handler.
pub struct App {
    pub logger: Logger,
    pub config: Arc<Config>,
    pub proxy: Arc<ProxyManager>,
    pub openapi: Arc<OpenApiManager>,
    pub forms: Arc<FormsManager>,
    pub email: Arc<EmailManager>,
    pub netlify: Arc<NetlifyManager>,
}

impl App {
    pub fn initialize(config: Config) -> Result<Self, GatewayError> {
        let logger = Logger::new("gateway");
        let validation = Validation::new();
        let config = Arc::new(config);
        let client = build_client()?;

        let store = FormStore::open(logger.clone(), &config.database_path)?;
        let openapi = Arc::new(OpenApiManager::new(
            logger.clone(),
            validation.clone(),
            client.clone(),
            config.spec_fetch_timeout,
        ));
        let proxy = Arc::new(ProxyManager::new(
            logger.clone(),
            config.clone(),
            validation.clone(),
            client.clone(),
            openapi.clone(),
        ));
        let forms = Arc::new(FormsManager::new(logger.clone(), validation.clone(), store));
        let email = Arc::new(EmailManager::new(
            logger.clone(),
            config.clone(),
            validation,
            client.clone(),
        ));
        let netlify = Arc::new(NetlifyManager::new(logger.clone(), config.clone(), client));

        logger.info(
            "Gateway initialized",
            Some(&serde_json::json!({
                "mode": if config.is_dev() { "dev" } else { "production" },
                "database": config.database_path,
                "allowed_origins": config.allowed_origins,
                "mailrelay": config.mailrelay.send_url().is_some(),
                "netlify_oauth": config.netlify.client_id.is_some(),
            })),
        );

        Ok(Self {
            logger,
            config,
            proxy,
            openapi,
            forms,
            email,
            netlify,
        })
    }

    pub async fn serve(self) -> Result<(), GatewayError> {
        let bind = self.config.bind;
        let logger = self.logger.clone();
        let router = crate::http::router::build(Arc::new(self));
        let listener = tokio::net::TcpListener::bind(bind).await?;
        logger.info(
            "Listening",
            Some(&serde_json::json!({ "addr": bind.to_string() })),
        );
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal(logger.clone()))
            .await?;
        logger.info("Shut down", None);
        Ok(())
    }
}

async fn shutdown_signal(logger: Logger) {
    if tokio::signal::ctrl_c().await.is_err() {
        logger.warn("Failed to install Ctrl-C handler", None);
        std::future::pending::<()>().await;
    }
}
