use crate::{Result, TestInfraError};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;
const CONNECT_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "bookmarker".to_string())]
    database: String,
    #[builder(default = "bookmarker".to_string())]
    username: String,
    #[builder(default = "bookmarker".to_string())]
    password: String,
    #[builder(default = "8.4".to_string())]
    tag: String,
}

/// A throwaway MySQL server running in a container.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        Ok(self.container.get_host().await?.to_string())
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(MYSQL_PORT).await?)
    }

    /// Connection string for the configured database and user.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Opens a small pool, retrying while the server finishes its first boot.
    ///
    /// The image logs "ready for connections" once for the temporary init
    /// server, so the wait strategy alone is not enough.
    pub async fn pool(&self) -> Result<MySqlPool> {
        let url = self.database_url().await?;

        for _ in 0..CONNECT_ATTEMPTS {
            match MySqlPoolOptions::new().max_connections(5).connect(&url).await {
                Ok(pool) => return Ok(pool),
                Err(_) => tokio::time::sleep(Duration::from_millis(500)).await,
            }
        }

        Err(TestInfraError::NotReady {
            service: "mysql",
            attempts: CONNECT_ATTEMPTS,
        })
    }
}
