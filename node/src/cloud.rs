use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use tokio::sync::mpsc;
use tracing::{info, warn};

use sensor_node_common::{CloudError, CloudTransport, NetworkConfig};

#[derive(Debug)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// MQTT transport. The rumqttc event loop runs on its own tokio task and
/// never touches node state: inbound publishes are forwarded over `inbound`
/// to the loop that owns the node.
pub struct HostCloud {
    host: String,
    port: u16,
    user: String,
    pass: String,
    client: Option<AsyncClient>,
    connected: Arc<AtomicBool>,
    connecting: Arc<AtomicBool>,
    filters: Arc<Mutex<Vec<String>>>,
    inbound: mpsc::Sender<InboundMessage>,
}

impl HostCloud {
    pub fn new(network: &NetworkConfig, inbound: mpsc::Sender<InboundMessage>) -> Self {
        Self {
            host: network.mqtt_host.clone(),
            port: network.mqtt_port,
            user: network.mqtt_user.clone(),
            pass: network.mqtt_pass.clone(),
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
            connecting: Arc::new(AtomicBool::new(false)),
            filters: Arc::new(Mutex::new(Vec::new())),
            inbound,
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::Relaxed)
    }
}

impl CloudTransport for HostCloud {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CloudError> {
        let client = self.client.as_ref().ok_or(CloudError::NotStarted)?;
        client
            .try_publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|err| CloudError::PublishRejected {
                topic: topic.to_string(),
                reason: err.to_string(),
            })
    }

    fn register_subscription(&mut self, filter: &str) {
        if let Ok(mut filters) = self.filters.lock() {
            if !filters.iter().any(|existing| existing == filter) {
                filters.push(filter.to_string());
            }
        }

        if let Some(client) = self.client.as_ref() {
            if self.connected.load(Ordering::Relaxed) {
                if let Err(err) = client.try_subscribe(filter, QoS::AtLeastOnce) {
                    warn!("subscribe to {filter} failed: {err}");
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn set_init_flag(&mut self) {
        self.connected.store(false, Ordering::Relaxed);
        let Some(client) = self.client.as_ref() else {
            return;
        };
        info!("cloud reconnect requested");
        self.connecting.store(true, Ordering::Relaxed);
        if let Err(err) = client.try_disconnect() {
            warn!("mqtt disconnect request failed: {err}");
        }
    }

    fn setup_task(&mut self, device_id: &str) {
        if self.client.is_some() {
            info!("cloud task already running");
            return;
        }

        let mut options = MqttOptions::new(device_id, self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(60));
        if !self.user.is_empty() {
            options.set_credentials(self.user.clone(), self.pass.clone());
        }

        let (client, eventloop) = AsyncClient::new(options, 32);
        self.connecting.store(true, Ordering::Relaxed);
        spawn_mqtt_loop(
            client.clone(),
            eventloop,
            self.connected.clone(),
            self.connecting.clone(),
            self.filters.clone(),
            self.inbound.clone(),
        );
        info!("cloud task started for {device_id} at {}:{}", self.host, self.port);
        self.client = Some(client);
    }
}

fn spawn_mqtt_loop(
    client: AsyncClient,
    mut eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    connecting: Arc<AtomicBool>,
    filters: Arc<Mutex<Vec<String>>>,
    inbound: mpsc::Sender<InboundMessage>,
) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                    connected.store(true, Ordering::Relaxed);
                    connecting.store(false, Ordering::Relaxed);

                    let topics = filters
                        .lock()
                        .map(|filters| filters.clone())
                        .unwrap_or_default();
                    for topic in topics {
                        if let Err(err) = client.subscribe(topic.as_str(), QoS::AtLeastOnce).await {
                            warn!("subscribe to {topic} failed: {err}");
                        }
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    let message = InboundMessage {
                        topic: message.topic,
                        payload: message.payload.to_vec(),
                    };
                    if inbound.send(message).await.is_err() {
                        warn!("node loop gone; stopping mqtt loop");
                        return;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    connected.store(false, Ordering::Relaxed);
                    connecting.store(true, Ordering::Relaxed);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}
