//! Runs against a real queue. Set `TEST_SQS_QUEUE_URL` (a `.env` file is
//! read) and run with `cargo test -- --ignored`.

use rs_sqs_listener::{
    client, errors::SqsListenerError, handler::FnHandler, listener::SqsListener,
    listener::config::ListenerConfig, message::Message, publisher,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

#[derive(Clone)]
struct SharedCounter {
    count: Arc<Mutex<i32>>,
}

impl SharedCounter {
    fn new() -> Self {
        Self {
            count: Arc::new(Mutex::new(0)),
        }
    }

    async fn increment(&self) {
        let mut count = self.count.lock().await;
        *count += 1;
    }

    async fn get_count(&self) -> i32 {
        *self.count.lock().await
    }
}

async fn test_handler(message: Message, shared: SharedCounter) -> Result<(), SqsListenerError> {
    println!("Received message: {}", message.body);
    shared.increment().await;
    Ok(())
}

fn queue_url() -> String {
    dotenvy::dotenv().ok();
    env::var("TEST_SQS_QUEUE_URL").expect("TEST_SQS_QUEUE_URL must be set")
}

#[tokio::test]
#[ignore = "requires an SQS queue"]
async fn test_sqs_integration() {
    let queue_url = queue_url();
    let sqs_client = Arc::new(client::create_sqs_client_from_env().await);

    publisher::dispatch(sqs_client.as_ref(), &queue_url, "IntegrationTest", "Test message 1")
        .await
        .expect("Failed to send test message 1");
    publisher::dispatch(sqs_client.as_ref(), &queue_url, "integrationtest", "Test message 2")
        .await
        .expect("Failed to send test message 2");

    let shared_counter = SharedCounter::new();

    let mut listener = SqsListener::builder()
        .shared_client(sqs_client.clone())
        .queue_url(&queue_url)
        .config(ListenerConfig::from_env().expect("invalid listener configuration"))
        .handler(FnHandler::new("IntegrationTest", test_handler, shared_counter.clone()).unwrap())
        .build()
        .expect("Failed to build listener");
    listener.start().unwrap();

    let timeout_result = timeout(Duration::from_secs(30), async {
        loop {
            if shared_counter.get_count().await >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    })
    .await;

    listener.shutdown().await;

    let final_count = shared_counter.get_count().await;
    assert!(
        timeout_result.is_ok(),
        "Test timed out. Only processed {} messages",
        final_count
    );
    assert!(listener.is_healthy());
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_unknown_queue_marks_listener_unhealthy() {
    dotenvy::dotenv().ok();
    let sqs_client = client::create_sqs_client_from_env().await;

    let mut listener = SqsListener::builder()
        .client(sqs_client)
        .queue_url("https://sqs.eu-west-1.amazonaws.com/000000000000/does-not-exist")
        .config(ListenerConfig {
            backoff: Duration::from_millis(200),
            ..Default::default()
        })
        .build()
        .unwrap();
    listener.start().unwrap();

    let became_unhealthy = timeout(Duration::from_secs(30), async {
        while listener.is_healthy() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    listener.shutdown().await;
    assert!(became_unhealthy.is_ok(), "listener never reported the failure");
}
