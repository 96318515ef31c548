use bollard::container::{Config, CreateContainerOptions, StartContainerOptions};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding, PortMap};
use bollard::Docker;
use futures_util::TryStreamExt;

use crate::port::TcpPort;
use crate::wait::ReadyCondition;

pub struct Container {
    pub image: String,
    pub name: String,
    pub client: Docker,
    pub env: Vec<(String, String)>,
    pub ready_condition: ReadyCondition,
    pub memory: Option<i64>,
    /// `(container port, host port)` pairs.
    pub exposed_port: Vec<(u16, u16)>,
}

impl Container {
    /// Pulls the image, then starts a fresh container and waits until it is ready.
    pub async fn run(&self) -> anyhow::Result<()> {
        // A stopped container from a previous run would hold the name.
        let _ = self.client.remove_container(&self.name, None).await;

        self.create_image().await?;
        self.client
            .create_container(
                Some(CreateContainerOptions {
                    name: self.name.as_str(),
                    platform: None,
                }),
                self.build_config(),
            )
            .await?;
        self.client
            .start_container(&self.name, None::<StartContainerOptions<String>>)
            .await?;
        self.wait_for_ready_condition().await
    }

    pub async fn is_running(&self) -> bool {
        let Ok(inspect_response) = self.client.inspect_container(&self.name, None).await else {
            return false;
        };

        inspect_response
            .state
            .and_then(|state| state.running)
            .unwrap_or(false)
    }

    async fn create_image(&self) -> anyhow::Result<()> {
        let _ = self
            .client
            .create_image(
                Some(CreateImageOptions {
                    from_image: self.image.as_str(),
                    ..Default::default()
                }),
                None,
                None,
            )
            .try_collect::<Vec<_>>()
            .await?;
        Ok(())
    }

    fn build_config(&self) -> Config<String> {
        let mut portmap = PortMap::new();
        for (container_port, host_port) in &self.exposed_port {
            portmap.insert(
                TcpPort(*container_port).to_string(),
                Some(vec![PortBinding {
                    host_ip: Some("127.0.0.1".to_string()),
                    host_port: Some(host_port.to_string()),
                }]),
            );
        }

        let host_config = HostConfig {
            port_bindings: Some(portmap),
            memory: self.memory,
            memory_swap: self.memory,
            ..Default::default()
        };

        Config {
            image: Some(self.image.clone()),
            env: Some(self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()),
            host_config: Some(host_config),
            ..Default::default()
        }
    }

    async fn wait_for_ready_condition(&self) -> anyhow::Result<()> {
        let ReadyCondition::HttpPull {
            url,
            expect,
            interval,
        } = &self.ready_condition;
        loop {
            if let Ok(response) = reqwest::get(url).await {
                if let Ok(text) = response.text().await {
                    if text.contains(expect) {
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(*interval).await;
        }
    }
}
