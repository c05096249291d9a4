//! Dockerfile lookup and port inference

use crate::error::{Result, UpError};
use crate::provider::SourceControl;
use crate::request::Ingress;
use std::io::ErrorKind;
use std::path::Path;

/// Port named by the last `EXPOSE` instruction.
///
/// Lines are matched case-insensitively; comments and `/tcp` `/udp`
/// suffixes are ignored. Within a line the first port wins, later lines
/// override earlier ones so the final build stage decides.
pub fn exposed_port(content: &str) -> Option<u16> {
    let mut port = None;
    for line in content.lines() {
        let line = line
            .trim()
            .to_uppercase()
            .replace("/TCP", "")
            .replace("/UDP", "");
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let exposed = tokens
            .windows(2)
            .filter(|pair| pair[0].contains("EXPOSE"))
            .find_map(|pair| pair[1].parse::<u16>().ok());
        if exposed.is_some() {
            port = exposed;
        }
    }
    port
}

/// Resolve ingress and target port.
///
/// The Dockerfile is consulted only when the caller gave neither a port nor
/// an ingress. A port without an ingress always means external ingress.
pub fn infer_ingress_and_port(
    ingress: Option<Ingress>,
    target_port: Option<u16>,
    dockerfile: Option<&str>,
) -> (Option<Ingress>, Option<u16>) {
    let mut ingress = ingress;
    let mut target_port = target_port;

    if target_port.is_none() && ingress.is_none() {
        if let Some(port) = dockerfile.and_then(exposed_port) {
            tracing::warn!(
                "Adding external ingress port {} based on dockerfile expose",
                port
            );
            target_port = Some(port);
            ingress = Some(Ingress::External);
        }
    }

    if target_port.is_some() && ingress.is_none() {
        ingress = Some(Ingress::External);
    }

    (ingress, target_port)
}

/// Read `<source>/<dockerfile>`. A missing file is not an error.
pub async fn read_local(source: &Path, dockerfile: &str) -> Result<Option<String>> {
    let path = source.join(dockerfile);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("No Dockerfile at {}", path.display());
            Ok(None)
        }
        Err(e) => Err(UpError::InvalidArgumentValue(format!(
            "Cannot open specified Dockerfile {}: {}. Check dockerfile name, path, and permissions.",
            path.display(),
            e
        ))),
    }
}

/// Fetch the Dockerfile of a repository at `branch`
pub async fn fetch_from_repo(
    source_control: &dyn SourceControl,
    repo_url: &str,
    branch: &str,
    token: Option<&str>,
    context_path: Option<&str>,
    dockerfile: &str,
) -> Result<Option<String>> {
    let path = repo_path(context_path, dockerfile);
    let bytes = source_control
        .get_file(repo_url, branch, &path, token)
        .await?;

    Ok(bytes
        .filter(|b| !b.is_empty())
        .map(|b| String::from_utf8_lossy(&b).into_owned()))
}

/// Path of the Dockerfile relative to the repository root
pub fn repo_path(context_path: Option<&str>, dockerfile: &str) -> String {
    let context = context_path
        .unwrap_or(".")
        .trim_start_matches("./")
        .trim_matches('/');
    if context.is_empty() || context == "." {
        dockerfile.to_string()
    } else {
        format!("{}/{}", context, dockerfile)
    }
}
