// invoice-design-service/src/main.rs

use anyhow::Context;
use google_cloud_pubsub::client::{Client, ClientConfig};
use google_cloud_pubsub::subscription::Subscription;
use invoice_design_service::config::Config;
use invoice_design_service::locale::LocaleCatalog;
use invoice_design_service::pubsub::{MessageHandler, Publisher};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Print to stderr BEFORE logging initialization to catch early failures
    eprintln!("Starting invoice-design-service...");

    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.service.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        default_design = %config.rendering.default_design,
        "Starting Invoice Design Service"
    );

    let mut catalog =
        LocaleCatalog::embedded(&config.locales.fallback).context("loading embedded locales")?;
    if let Some(dir) = &config.locales.path {
        catalog
            .load_overrides(Path::new(dir))
            .with_context(|| format!("loading locale overrides from {}", dir))?;
    }
    info!(
        fallback = %catalog.fallback(),
        locales = ?catalog.codes().collect::<Vec<_>>(),
        "Locale catalog ready"
    );

    invoice_design_service::designs::get_variant(&config.rendering.default_design)
        .context("checking rendering.default_design")?;

    let client_config = ClientConfig::default()
        .with_auth()
        .await
        .context("creating Pub/Sub client config")?;
    let client = Client::new(client_config)
        .await
        .context("creating Pub/Sub client")?;

    info!(
        project_id = %config.pubsub.project_id,
        subscription = %config.pubsub.request_subscription,
        "Initializing Pub/Sub client"
    );

    let subscription = client.subscription(&config.pubsub.request_subscription);

    let publisher = Publisher::new(&config.pubsub.project_id, &config.pubsub.response_topic).await?;

    let handler = Arc::new(MessageHandler::new(
        Arc::new(catalog),
        &config.pdf,
        config.rendering.default_design.clone(),
    ));
    let publisher = Arc::new(publisher);

    process_messages(
        subscription,
        handler,
        publisher,
        config.pubsub.max_concurrent_messages,
    )
    .await;

    Ok(())
}

async fn process_messages(
    subscription: Subscription,
    handler: Arc<MessageHandler>,
    publisher: Arc<Publisher>,
    max_concurrent: usize,
) {
    use tokio::signal;
    use tokio_util::sync::CancellationToken;

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, cancelling message processing");
                cancel_for_signal.cancel();
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    info!(max_concurrent, "Starting message processing loop");

    loop {
        if cancel.is_cancelled() {
            info!("Message processing cancelled, exiting loop");
            break;
        }

        let handler_clone = handler.clone();
        let publisher_clone = publisher.clone();
        let permits_clone = permits.clone();

        let result = subscription
            .receive(
                move |message, cancel| {
                    let handler = handler_clone.clone();
                    let publisher = publisher_clone.clone();
                    let permits = permits_clone.clone();

                    async move {
                        if cancel.is_cancelled() {
                            return;
                        }

                        let Ok(_permit) = permits.acquire_owned().await else {
                            return;
                        };

                        info!(
                            message_id = %message.message.message_id,
                            "Processing message"
                        );

                        let response = handler.handle_message(&message.message.data).await;

                        publisher.publish_response(&response).await;

                        if let Err(e) = message.ack().await {
                            error!(
                                message_id = %message.message.message_id,
                                error = %e,
                                "Failed to acknowledge message"
                            );
                        } else {
                            info!(
                                message_id = %message.message.message_id,
                                request_id = %response.request_id,
                                status = %response.status,
                                "Message processed and acknowledged"
                            );
                        }
                    }
                },
                cancel.clone(),
                None,
            )
            .await;

        match result {
            Ok(()) => {
                info!("subscription.receive() completed, continuing loop");
            }
            Err(e) => {
                error!("Error receiving messages: {}", e);
                error!("Retrying in 5 seconds...");
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }

    info!("Message processing loop exited");
}
