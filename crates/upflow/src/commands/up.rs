use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use upflow_az::AzProvider;
use upflow_config::Config;
use upflow_core::request::parse_env_vars;
use upflow_core::{ActionType, Ingress, Platform, UpOutcome, UpRequest};

#[derive(Args, Debug)]
pub struct UpArgs {
    /// Container app name
    #[arg(short, long)]
    pub name: String,

    /// Resource group of the app
    #[arg(short = 'g', long)]
    pub resource_group: Option<String>,

    /// Environment name or fully-qualified id
    #[arg(long)]
    pub environment: Option<String>,

    /// Location for new resources
    #[arg(short, long)]
    pub location: Option<String>,

    /// Image to deploy, or the name of the image to build
    #[arg(short, long)]
    pub image: Option<String>,

    /// Local directory to build remotely
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// GitHub repository to deploy through a CI workflow
    #[arg(long)]
    pub repo: Option<String>,

    /// Branch of the repository
    #[arg(short, long)]
    pub branch: Option<String>,

    /// GitHub token with access to the repository
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Build context inside the repository
    #[arg(long)]
    pub context_path: Option<String>,

    /// Dockerfile name
    #[arg(long)]
    pub dockerfile: Option<String>,

    #[arg(long)]
    pub registry_server: Option<String>,

    #[arg(long)]
    pub registry_username: Option<String>,

    #[arg(long, env = "UPFLOW_REGISTRY_PASSWORD", hide_env_values = true)]
    pub registry_password: Option<String>,

    /// Port the container listens on
    #[arg(long)]
    pub target_port: Option<u16>,

    /// external or internal
    #[arg(long)]
    pub ingress: Option<Ingress>,

    /// Environment variables, KEY=VALUE
    #[arg(long, num_args = 1..)]
    pub env_vars: Vec<String>,

    /// Log workspace customer id
    #[arg(long)]
    pub logs_workspace_id: Option<String>,

    #[arg(long, hide_env_values = true, env = "UPFLOW_LOGS_WORKSPACE_KEY")]
    pub logs_workspace_key: Option<String>,

    #[arg(long)]
    pub service_principal_client_id: Option<String>,

    #[arg(long, env = "UPFLOW_SP_CLIENT_SECRET", hide_env_values = true)]
    pub service_principal_client_secret: Option<String>,

    #[arg(long)]
    pub service_principal_tenant_id: Option<String>,
}

impl UpArgs {
    pub fn into_request(self, config: &Config) -> anyhow::Result<UpRequest> {
        Ok(UpRequest {
            name: self.name,
            resource_group: self.resource_group,
            environment: self.environment,
            location: self.location.or_else(|| config.location.clone()),
            image: self.image,
            source: self.source,
            repo: self.repo,
            branch: self.branch,
            token: self.token,
            context_path: self.context_path,
            dockerfile: self.dockerfile,
            registry_server: self.registry_server,
            registry_username: self.registry_username,
            registry_password: self.registry_password,
            target_port: self.target_port,
            ingress: self.ingress,
            env_vars: parse_env_vars(self.env_vars.as_slice())?,
            logs_customer_id: self.logs_workspace_id,
            logs_key: self.logs_workspace_key,
            service_principal_client_id: self.service_principal_client_id,
            service_principal_client_secret: self.service_principal_client_secret,
            service_principal_tenant_id: self.service_principal_tenant_id,
        })
    }
}

pub async fn handle(args: UpArgs, config: &Config) -> anyhow::Result<()> {
    let request = args.into_request(config)?;
    request.validate()?;

    let provider = Arc::new(AzProvider::new());
    let caller = provider
        .caller_identity(config.location.clone(), config.username.clone())
        .await?;
    let platform = Platform::from_provider(provider, caller);

    println!("{} {}", "Bringing up".bold(), request.name.cyan());
    println!();

    let outcome = upflow_core::up(&platform, &request).await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &UpOutcome) {
    for action in &outcome.report.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Reuse => "=".dimmed(),
        };
        match &action.resource_group {
            Some(group) => println!(
                "  {} {} {} ({})",
                marker,
                action.kind,
                action.name.cyan(),
                group
            ),
            None => println!("  {} {} {}", marker, action.kind, action.name.cyan()),
        }
    }

    println!();
    println!(
        "{} {} in {:.1}s",
        "✓".green(),
        outcome.report.summary(),
        outcome.report.duration_ms as f64 / 1000.0
    );
    println!();
    println!("{}", outcome.summary);
}
