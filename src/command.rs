use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config;
use crate::external;
use crate::message::Message;
use crate::model::{ClusterJobKind, HttpRequest};
use crate::panel::PanelKind;

/// Deferred work requested by a panel or the dispatcher.
///
/// Handlers only return these values; the runtime executes them off the loop
/// and feeds the resulting [`Message`] back in.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    CheckBinary {
        binary: String,
    },
    LoadConfig {
        path: Option<PathBuf>,
    },
    SendHttp(HttpRequest),
    ListClusters,
    CreateCluster {
        name: String,
        config: Option<String>,
    },
    DeleteCluster {
        name: String,
    },
    DescribeCluster {
        name: String,
    },
    SampleSystem,
    /// Runs an interactive program in the foreground terminal.
    Launch {
        binary: String,
    },
}

impl Command {
    /// Foreground commands own the terminal and must run with the UI suspended.
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }

    pub async fn execute(self) -> Option<Message> {
        debug!("executing command={self:?}");
        let message = match self {
            Self::CheckBinary { binary } => {
                let found = external::binary_in_path(&binary);
                if !found {
                    warn!("binary '{binary}' not found in PATH");
                }
                Message::BinaryChecked { binary, found }
            }
            Self::LoadConfig { path } => {
                let loaded = tokio::task::spawn_blocking(move || {
                    config::load_or_default(path.as_deref())
                })
                .await
                .unwrap_or_default();
                Message::ConfigLoaded(loaded)
            }
            Self::SendHttp(request) => Message::HttpResponseReady(
                external::send_http(&request)
                    .await
                    .map_err(|error| compact_error(&error)),
            ),
            Self::ListClusters => match external::list_clusters().await {
                Ok(names) => Message::ClusterListReady(names),
                Err(error) => Message::Error {
                    origin: PanelKind::Cluster,
                    message: compact_error(&error),
                },
            },
            Self::CreateCluster { name, config } => Message::ClusterOpDone {
                kind: ClusterJobKind::Create,
                result: external::create_cluster(&name, config.as_deref())
                    .await
                    .map_err(|error| compact_error(&error)),
            },
            Self::DeleteCluster { name } => Message::ClusterOpDone {
                kind: ClusterJobKind::Delete,
                result: external::delete_cluster(&name)
                    .await
                    .map_err(|error| compact_error(&error)),
            },
            Self::DescribeCluster { name } => {
                let text = external::describe_cluster(&name).await;
                Message::ClusterDescribeReady { name, text }
            }
            Self::SampleSystem => {
                match tokio::task::spawn_blocking(external::sample_system).await {
                    Ok(snapshot) => Message::SystemSampled(snapshot),
                    Err(error) => {
                        warn!("system sampling task failed: {error}");
                        Message::Error {
                            origin: PanelKind::Dashboard,
                            message: format!("system sampling task failed: {error}"),
                        }
                    }
                }
            }
            Self::Launch { binary } => {
                let result = external::launch(&binary)
                    .await
                    .map_err(|error| compact_error(&error));
                Message::LaunchFinished { binary, result }
            }
        };
        Some(message)
    }
}

pub fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Command, compact_error};
    use crate::message::Message;
    use anyhow::Context;

    #[test]
    fn only_launch_runs_in_foreground() {
        assert!(
            Command::Launch {
                binary: "nvim".to_string()
            }
            .is_foreground()
        );
        assert!(!Command::ListClusters.is_foreground());
        assert!(!Command::SampleSystem.is_foreground());
    }

    #[test]
    fn compact_error_keeps_first_causes() {
        let error = Err::<(), _>(anyhow::anyhow!("root"))
            .context("middle")
            .context("top")
            .expect_err("chain should fail");
        assert_eq!(
            compact_error(&error),
            "top\ncaused by: middle\ncaused by: root"
        );
    }

    #[tokio::test]
    async fn missing_binary_check_reports_not_found() {
        let message = Command::CheckBinary {
            binary: "phantom-definitely-missing-binary".to_string(),
        }
        .execute()
        .await;
        match message {
            Some(Message::BinaryChecked { binary, found }) => {
                assert_eq!(binary, "phantom-definitely-missing-binary");
                assert!(!found);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_config_loads_empty_defaults() {
        let message = Command::LoadConfig {
            path: Some("/nonexistent/phantom/config.yaml".into()),
        }
        .execute()
        .await;
        match message {
            Some(Message::ConfigLoaded(config)) => {
                assert!(config.templates.is_empty());
                assert!(config.environment.is_empty());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
