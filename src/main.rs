use log::{error, info};
use p1mqtt::metering_p1::FramingError;
use p1mqtt::mqtt::publish_status;
use p1mqtt::{input, Config, MqttManager, P1Error, P1Manager};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let default_filter = std::env::var("P1_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let config = Config::load()?;
    let source = input::open(&config.input)?;

    let mut sender = None;
    let mut mqtt_thread = None;
    if let Some(mqtt_config) = &config.mqtt {
        let (mut mqtt, tx) = MqttManager::new(mqtt_config);
        mqtt_thread = Some(tokio::spawn(async move {
            mqtt.start_thread().await;
        }));

        publish_status(&tx, mqtt_config).await;
        sender = Some(tx);
    }

    let p1 = P1Manager::new(sender, config.json_output);
    let result = p1.start_thread(source).await;

    // The reader dropped its sender, let the queue drain
    if let Some(thread) = mqtt_thread {
        if let Err(e) = thread.await {
            error!("MQTT thread failed: {e}");
        }
    }

    match result {
        Err(P1Error::Framing(FramingError::EndOfStream { lines_read })) => {
            info!("P1 input ended after {lines_read} trailing lines");
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(()) => {
            info!("P1 reader finished");
            Ok(())
        }
    }
}
