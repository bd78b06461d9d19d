use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use sysinfo::{Disks, System};
use tokio::process::Command as TokioCommand;

use crate::model::{HttpRequest, HttpResponse, ProcessRow, SystemSnapshot};

pub const KIND_BINARY: &str = "kind";
const CURL_BINARY: &str = "curl";
const KUBECTL_BINARY: &str = "kubectl";
const DESCRIBE_FALLBACK: &str = "Unable to describe cluster (is kubectl installed & in PATH?)";

pub fn binary_in_path(name: &str) -> bool {
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(candidate: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    candidate
        .metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(candidate: &Path) -> bool {
    candidate.is_file() || candidate.with_extension("exe").is_file()
}

pub fn curl_args(request: &HttpRequest) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        "-s".to_string(),
        "-S".to_string(),
        "-L".to_string(),
        "-X".to_string(),
        request.method.as_str().to_string(),
    ];
    for header in &request.headers {
        args.push("-H".to_string());
        args.push(header.clone());
    }
    if let Some(body) = &request.body {
        args.push("-d".to_string());
        args.push(body.clone());
    }
    args.push(request.url.clone());
    args
}

pub async fn send_http(request: &HttpRequest) -> Result<HttpResponse> {
    let output = TokioCommand::new(CURL_BINARY)
        .args(curl_args(request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("failed to execute curl for {}", request.url))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "curl failed: {}\nOutput: {}{}",
            output.status,
            stdout,
            stderr
        );
    }

    HttpResponse::parse(&stdout)
}

pub fn parse_cluster_list(output: &str) -> Vec<String> {
    output.split_whitespace().map(str::to_string).collect()
}

pub fn create_cluster_args(name: &str, config: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "cluster".to_string(),
        "--name".to_string(),
        name.to_string(),
    ];
    if let Some(config) = config {
        args.push("--config".to_string());
        args.push(config.to_string());
    }
    args
}

pub async fn list_clusters() -> Result<Vec<String>> {
    let output = TokioCommand::new(KIND_BINARY)
        .args(["get", "clusters"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("failed to execute kind get clusters")?;

    if !output.status.success() {
        anyhow::bail!(
            "kind get clusters exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(parse_cluster_list(&String::from_utf8_lossy(&output.stdout)))
}

pub async fn create_cluster(name: &str, config: Option<&str>) -> Result<()> {
    run_kind(create_cluster_args(name, config)).await
}

pub async fn delete_cluster(name: &str) -> Result<()> {
    run_kind(vec![
        "delete".to_string(),
        "cluster".to_string(),
        "--name".to_string(),
        name.to_string(),
    ])
    .await
}

async fn run_kind(args: Vec<String>) -> Result<()> {
    let rendered = args.join(" ");
    let output = TokioCommand::new(KIND_BINARY)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("failed to execute kind {rendered}"))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "kind {rendered} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}

pub fn kind_config_path(home: &Path, name: &str) -> PathBuf {
    home.join(".kind").join("clusters").join(name)
}

pub async fn describe_cluster(name: &str) -> String {
    if let Some(home) = std::env::var_os("HOME")
        && let Ok(raw) = tokio::fs::read_to_string(kind_config_path(Path::new(&home), name)).await
        && !raw.trim().is_empty()
    {
        return raw;
    }

    let context = format!("kind-{name}");
    let info = kubectl_combined(&["cluster-info", "--context", &context]).await;
    let nodes = kubectl_combined(&["--context", &context, "get", "nodes", "-o", "wide"]).await;
    compose_description(&info, &nodes)
}

/// Failures degrade to an empty string.
async fn kubectl_combined(args: &[&str]) -> String {
    match TokioCommand::new(KUBECTL_BINARY)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) => format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ),
        Err(error) => {
            tracing::debug!("kubectl {} failed: {error}", args.join(" "));
            String::new()
        }
    }
}

pub fn compose_description(info: &str, nodes: &str) -> String {
    let info = info.trim();
    let nodes = nodes.trim();
    if info.is_empty() && nodes.is_empty() {
        DESCRIBE_FALLBACK.to_string()
    } else {
        format!("{info}\n\n{nodes}")
    }
}

/// Blocking: samples CPU twice across the minimum refresh interval.
pub fn sample_system() -> SystemSnapshot {
    let mut system = System::new();
    system.refresh_cpu();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu();
    system.refresh_memory();
    system.refresh_processes();

    let memory_percent = percent(system.used_memory(), system.total_memory());

    let disks = Disks::new_with_refreshed_list();
    let disk_percent = disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first())
        .map(|disk| {
            percent(
                disk.total_space().saturating_sub(disk.available_space()),
                disk.total_space(),
            )
        })
        .unwrap_or(0.0);

    let mut processes = system
        .processes()
        .values()
        .map(|process| ProcessRow {
            name: process.name().to_string(),
            pid: process.pid().as_u32(),
            memory_bytes: process.memory(),
        })
        .collect::<Vec<_>>();
    sort_processes(&mut processes);

    SystemSnapshot {
        cpu_percent: system.global_cpu_info().cpu_usage(),
        memory_percent,
        disk_percent,
        processes,
    }
}

pub fn sort_processes(processes: &mut [ProcessRow]) {
    processes.sort_by(|left, right| {
        right
            .memory_bytes
            .cmp(&left.memory_bytes)
            .then_with(|| left.pid.cmp(&right.pid))
    });
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}

/// Runs `binary` attached to the terminal; the caller suspends the UI.
pub async fn launch(binary: &str) -> Result<String> {
    let status = TokioCommand::new(binary)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("failed to launch {binary}"))?;

    if status.success() {
        Ok(format!("{binary} exited cleanly"))
    } else {
        Err(anyhow::anyhow!("{binary} exited with {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DESCRIBE_FALLBACK, compose_description, create_cluster_args, curl_args,
        kind_config_path, parse_cluster_list, percent, sort_processes,
    };
    use crate::model::{HttpMethod, HttpRequest, ProcessRow};
    use std::path::Path;

    #[test]
    fn curl_args_follow_method_headers_body_url_order() {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://api.example.com/items".to_string(),
            headers: vec![
                "Content-Type: application/json".to_string(),
                "X-Token: abc".to_string(),
            ],
            body: Some("{\"a\":1}".to_string()),
        };
        assert_eq!(
            curl_args(&request),
            vec![
                "-i",
                "-s",
                "-S",
                "-L",
                "-X",
                "POST",
                "-H",
                "Content-Type: application/json",
                "-H",
                "X-Token: abc",
                "-d",
                "{\"a\":1}",
                "https://api.example.com/items",
            ]
        );
    }

    #[test]
    fn curl_args_skip_body_flag_without_body() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let args = curl_args(&request);
        assert!(!args.iter().any(|arg| arg == "-d"));
        assert_eq!(args.last().map(String::as_str), Some("http://localhost"));
    }

    #[test]
    fn cluster_list_splits_on_whitespace() {
        assert_eq!(parse_cluster_list("alpha\nbeta  gamma\n"), vec![
            "alpha", "beta", "gamma"
        ]);
        assert!(parse_cluster_list("").is_empty());
        assert!(parse_cluster_list("\n  \n").is_empty());
    }

    #[test]
    fn create_args_only_pass_config_when_given() {
        assert_eq!(create_cluster_args("dev", None), vec![
            "create", "cluster", "--name", "dev"
        ]);
        assert_eq!(create_cluster_args("dev", Some("kind.yaml")), vec![
            "create",
            "cluster",
            "--name",
            "dev",
            "--config",
            "kind.yaml"
        ]);
    }

    #[test]
    fn description_joins_outputs_or_falls_back() {
        assert_eq!(compose_description("  \n", ""), DESCRIBE_FALLBACK);
        assert_eq!(
            compose_description("Kubernetes control plane\n", "NAME STATUS\n"),
            "Kubernetes control plane\n\nNAME STATUS"
        );
    }

    #[test]
    fn kind_config_lives_under_home() {
        assert_eq!(
            kind_config_path(Path::new("/home/dev"), "demo"),
            Path::new("/home/dev/.kind/clusters/demo")
        );
    }

    #[test]
    fn processes_sort_by_memory_descending() {
        let mut rows = vec![
            ProcessRow {
                name: "small".to_string(),
                pid: 3,
                memory_bytes: 10,
            },
            ProcessRow {
                name: "big".to_string(),
                pid: 1,
                memory_bytes: 900,
            },
            ProcessRow {
                name: "mid".to_string(),
                pid: 2,
                memory_bytes: 50,
            },
        ];
        sort_processes(&mut rows);
        let names = rows.iter().map(|row| row.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["big", "mid", "small"]);
    }

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(50, 200), 25.0);
    }
}
