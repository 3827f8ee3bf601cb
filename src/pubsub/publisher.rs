// invoice-design-service/src/pubsub/publisher.rs

use crate::models::RenderResponse;
use anyhow::Context;
use google_cloud_pubsub::client::{Client, ClientConfig};
use google_cloud_pubsub::publisher::Publisher as PubSubPublisher;
use tracing::{error, info};

pub struct Publisher {
    publisher: PubSubPublisher,
    topic_name: String,
}

impl Publisher {
    pub async fn new(project_id: &str, topic_name: &str) -> anyhow::Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("creating Pub/Sub publisher credentials")?;
        let client = Client::new(config)
            .await
            .context("creating Pub/Sub publisher client")?;

        let topic = client.topic(topic_name);
        let publisher = topic.new_publisher(None);

        info!(
            project_id = %project_id,
            topic = %topic_name,
            "Publisher initialized"
        );

        Ok(Self {
            publisher,
            topic_name: topic_name.to_string(),
        })
    }

    pub async fn publish_response(&self, response: &RenderResponse) {
        let json_data = match serde_json::to_vec(response) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                return;
            }
        };

        // Create PubsubMessage using googleapis
        let message = google_cloud_googleapis::pubsub::v1::PubsubMessage {
            data: json_data,
            attributes: vec![
                ("request_id".to_string(), response.request_id.clone()),
                ("status".to_string(), response.status.clone()),
                (
                    "document_count".to_string(),
                    response.documents.len().to_string(),
                ),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };

        let awaiter = self.publisher.publish(message).await;

        match awaiter.get().await {
            Ok(message_id) => {
                info!(
                    request_id = %response.request_id,
                    message_id = %message_id,
                    topic = %self.topic_name,
                    status = %response.status,
                    "Response published successfully"
                );
            }
            Err(e) => {
                error!(
                    request_id = %response.request_id,
                    error = %e,
                    "Failed to publish response"
                );
            }
        }
    }
}
