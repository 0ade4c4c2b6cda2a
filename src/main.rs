use std::{
    process,
    sync::{Arc, OnceLock},
};

use chatterd::{
    config::Config,
    core::{publisher::PeriodicPublisher, readiness::Readiness},
    logger::LoggerManager,
    print_error,
};
use chatterd_mqtt::MqttManager;
use tracing::{debug, error, info};

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::new().unwrap_or_else(|e| {
            print_error!("{}", e);
            process::exit(1);
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config();
    let mut logger_manager = LoggerManager::new(cfg.logger.clone()).unwrap_or_else(|e| {
        print_error!("Failed to setup Log Manager: {}", e);
        process::exit(1);
    });
    logger_manager.init().unwrap_or_else(|e| {
        print_error!("Failed to init Log Manager: {}", e);
        process::exit(1);
    });

    info!("Starting chatterd version {}...", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", cfg.logger.level);
    debug!("{:#?}", cfg.transport);

    info!("Starting MQTT client...");

    let manager = MqttManager::from_config(
        cfg.transport.clone(),
        cfg.publisher.queue_depth as usize,
    )
    .unwrap_or_else(|e| {
        error!("Failed to create MqttManager: {}", e);
        process::exit(1);
    });

    let instance = Arc::new(manager.build_and_start().await.unwrap_or_else(|e| {
        error!("Failed to build and start MQTT transport: {}", e);
        process::exit(1);
    }));

    info!("MQTT client started");

    let readiness = Readiness::default();
    readiness.start_listening(instance.state_receiver()).await;

    let sink = chatterd_mqtt::Publisher::new(instance.clone(), cfg.publisher.endpoint())
        .unwrap_or_else(|e| {
            error!(
                "Failed to bind publisher handle to topic '{}': {}",
                cfg.publisher.topic, e
            );
            instance.cancel_token().cancel();
            process::exit(1);
        });

    info!(
        "Publisher bound to topic '{}' (period: {} ms, queue depth: {})",
        cfg.publisher.topic, cfg.publisher.period_ms, cfg.publisher.queue_depth
    );

    let publisher = PeriodicPublisher::new(Arc::new(sink), cfg.publisher.period(), readiness);
    let shutdown = publisher.shutdown_token();

    tokio::select! {
        _ = publisher.run() => {
            error!("Publisher loop unexpectedly finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C — initiating graceful shutdown...");

            shutdown.cancel();
            instance.cancel_token().cancel();
            debug!("Cancellation tokens triggered — MQTT disconnecting...");
            tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;

            info!("Shutdown complete");
        }
    }
    Ok(())
}
