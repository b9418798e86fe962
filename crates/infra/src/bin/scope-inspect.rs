use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use serde::Serialize;

use backoffice_auth::{catalog, navigation};
use backoffice_auth::{
    AuthorizationExplanation, Capability, CapabilityRequirement, MenuItem, PrincipalKind, ScopeOptions, TreeNode,
};
use backoffice_core::UserId;
use backoffice_infra::{AccessConfig, AccessService, DirectorySnapshot, InMemoryDirectory, TimeoutStore};

/// Show what a back-office user may do and see, given a directory fixture.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the capability catalog and exit.
    #[arg(long)]
    catalog: bool,

    /// JSON directory fixture (departments, menus, roles, users).
    #[arg(short, long, env = "BACKOFFICE_FIXTURE", required_unless_present = "catalog")]
    fixture: Option<PathBuf>,

    /// Id of the user to inspect.
    #[arg(short, long, required_unless_present = "catalog")]
    user: Option<String>,

    /// Capability token the operation requires (repeatable).
    #[arg(short, long = "require")]
    require: Vec<String>,

    /// One required token is enough (default: all of them).
    #[arg(long)]
    any: bool,

    /// Expand the user's department to its whole subtree.
    #[arg(long)]
    subdepartments: bool,

    /// Keep the user's own records visible.
    #[arg(long)]
    own_record_fallback: bool,

    /// Base filter (JSON) to AND with the scope.
    #[arg(long)]
    base: Option<String>,
}

#[derive(Serialize)]
struct Report {
    user: UserId,
    kind: PrincipalKind,
    capabilities: Vec<Capability>,
    routes: Vec<TreeNode<MenuItem>>,
    authorization: AuthorizationExplanation,
    /// Required tokens that are not in the catalog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    uncatalogued: Vec<String>,
    filter: serde_json::Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    backoffice_observability::init();
    let config = AccessConfig::from_env()?;

    let args = Args::parse();
    if args.catalog {
        println!("{}", serde_json::to_string_pretty(&catalog::definitions())?);
        return Ok(());
    }
    let (Some(fixture), Some(user)) = (args.fixture, args.user) else {
        return Err(anyhow!("--fixture and --user are required"));
    };

    let raw = std::fs::read_to_string(&fixture)
        .with_context(|| format!("failed to read fixture {}", fixture.display()))?;
    let snapshot = DirectorySnapshot::from_json(&raw).context("fixture is not a valid directory snapshot")?;
    let directory = InMemoryDirectory::from_snapshot(snapshot)?;

    let user_id = UserId::new(user);
    let user = directory
        .user(&user_id)?
        .ok_or_else(|| anyhow!("user {user_id} not found in fixture"))?;

    let store = Arc::new(TimeoutStore::new(directory, config.store_timeout()));
    let service = AccessService::new(store, config.scope.clone());

    let principal = service.principal(&user).await?;

    let uncatalogued: Vec<String> = args
        .require
        .iter()
        .filter(|token| !catalog::is_catalogued(token))
        .cloned()
        .collect();
    if !uncatalogued.is_empty() {
        tracing::warn!(tokens = ?uncatalogued, "required tokens are not in the capability catalog");
    }

    let tokens = args.require.into_iter().map(Capability::new);
    let requirement = if args.any {
        CapabilityRequirement::any(tokens)
    } else {
        CapabilityRequirement::all(tokens)
    };

    let options = ScopeOptions {
        include_subdepartments: args.subdepartments,
        include_own_record_fallback: args.own_record_fallback,
    };
    let base = match args.base.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("--base is not valid JSON")?,
        None => serde_json::json!({}),
    };

    let report = Report {
        user: principal.id().clone(),
        kind: principal.kind(),
        capabilities: navigation::capabilities(&principal).into_iter().collect(),
        routes: service.route_tree(&principal).await?,
        authorization: service.explain(&principal, &requirement),
        uncatalogued,
        filter: service.scoped_filter(&principal, options, base).await?,
    };

    tracing::info!(
        user = %report.user,
        granted = report.authorization.granted,
        "inspection complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
