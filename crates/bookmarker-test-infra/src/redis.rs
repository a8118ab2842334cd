use crate::{Result, TestInfraError};
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};

const REDIS_PORT: u16 = 6379;
const CONNECT_ATTEMPTS: u32 = 20;

/// A single throwaway Redis server running in a container.
pub struct RedisServer {
    container: ContainerAsync<GenericImage>,
}

impl RedisServer {
    pub async fn new() -> Result<Self> {
        let container = GenericImage::new("redis", "8.6.0")
            .with_exposed_port(REDIS_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await?;
        Ok(Self { container })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();

        // Avoid resolving to ::1 when the port is only bound on IPv4.
        match host.as_str() {
            "localhost" => Ok(String::from("127.0.0.1")),
            _ => Ok(host),
        }
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(REDIS_PORT).await?)
    }

    pub async fn redis_url(&self) -> Result<String> {
        Ok(format!("redis://{}:{}", self.host().await?, self.port().await?))
    }

    /// Opens a multiplexed connection, retrying while the server warms up.
    pub async fn connection(&self) -> Result<MultiplexedConnection> {
        let client = redis::Client::open(self.redis_url().await?)?;

        for _ in 0..CONNECT_ATTEMPTS {
            if let Ok(conn) = client.get_multiplexed_async_connection().await {
                return Ok(conn);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        Err(TestInfraError::NotReady {
            service: "redis",
            attempts: CONNECT_ATTEMPTS,
        })
    }
}
