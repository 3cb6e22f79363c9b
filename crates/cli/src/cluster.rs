use std::path::Path;
use std::time::Instant;

use saltctl_cloudstack::CloudStack;
use saltctl_core::{CloudProvider, DeployRequest, Node, SshInterface};

use crate::config::{self, Config};
use crate::offering::{self, Offering};
use crate::sh;
use crate::spinner;

/// The only node names this tool manages; anything else in the account is
/// left alone.
pub const SALT_NODES: [&str; 3] = ["salt", "minion1", "minion2"];

const SSH_INTERFACE: SshInterface = SshInterface::Private;
const SSH_USER: &str = "root";

const MASTER_BOOTSTRAP: &str = "#!/bin/bash\ncurl -L http://bootstrap.saltstack.com | sh -s -- -M\n";
const MINION_BOOTSTRAP: &str = "#!/bin/bash\ncurl -L http://bootstrap.saltstack.com | sh\n";

/// Seam for running the bootstrap script on a freshly created node. The
/// real implementation shells out to ssh; tests record the calls.
pub trait Bootstrap {
    fn run(&self, node: &Node, script: &str) -> Result<(), Box<dyn std::error::Error>>;
}

struct SshBootstrap<'a> {
    key_path: &'a Path,
}

impl Bootstrap for SshBootstrap<'_> {
    fn run(&self, node: &Node, script: &str) -> Result<(), Box<dyn std::error::Error>> {
        let address = node
            .ssh_address(SSH_INTERFACE)
            .ok_or_else(|| format!("node {} has no reachable address", node.name))?;
        sh::run_script(address, SSH_USER, self.key_path, script)
    }
}

pub fn handle_deploy() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let provider = connect(&config);
    let offering = offering::resolve(&provider, &config.ssh_key_file)?;
    let bootstrap = SshBootstrap {
        key_path: &config.ssh_key_path,
    };
    deploy_cluster(&provider, &offering, &bootstrap)
}

pub fn handle_list() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let provider = connect(&config);
    print_nodes(&provider)
}

pub fn handle_destroy(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let provider = connect(&config);
    destroy_node(&provider, name)
}

fn connect(config: &Config) -> CloudStack {
    CloudStack::new(
        config.api_key.clone(),
        config.secret_key.clone(),
        config.host.clone(),
        config::API_PATH,
    )
}

/// Creates the master first, then the minions, strictly in order. Each
/// creation re-lists the account and refuses to proceed if any managed
/// name already exists, so a crashed earlier run is caught on retry.
/// Names created by this run are expected to show up in those listings
/// and are not collisions.
pub fn deploy_cluster(
    provider: &dyn CloudProvider,
    offering: &Offering,
    bootstrap: &dyn Bootstrap,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut created: Vec<&str> = Vec::new();
    deploy_node(provider, offering, bootstrap, "salt", MASTER_BOOTSTRAP, &created)?;
    created.push("salt");
    for name in ["minion1", "minion2"] {
        deploy_node(provider, offering, bootstrap, name, MINION_BOOTSTRAP, &created)?;
        created.push(name);
    }
    Ok(())
}

fn deploy_node(
    provider: &dyn CloudProvider,
    offering: &Offering,
    bootstrap: &dyn Bootstrap,
    name: &str,
    script: &str,
    created_this_run: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    check_collision(provider, created_this_run)?;

    let start = Instant::now();
    println!("start {}", name);

    spinner::with_spinner(&format!("{} is up", name), |spinner| {
        spinner.set_message(format!("Creating node {}...", name));
        let node = provider.deploy_node(&DeployRequest {
            name: name.to_string(),
            image_id: offering.image.id.clone(),
            offering_id: offering.size.id.clone(),
            keypair: offering.keypair.clone(),
        })?;

        spinner.set_message(format!("Bootstrapping {}...", name));
        bootstrap.run(&node, script)
    })?;

    println!("end {}, elapsed: {:.1}s", name, start.elapsed().as_secs_f64());
    Ok(())
}

fn check_collision(
    provider: &dyn CloudProvider,
    created_this_run: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    for node in provider.list_nodes()? {
        let name = node.name.as_str();
        if SALT_NODES.contains(&name) && !created_this_run.contains(&name) {
            return Err(format!(
                "{} already exists, please destroy this vm beforehand",
                node.name
            )
            .into());
        }
    }
    Ok(())
}

pub fn print_nodes(provider: &dyn CloudProvider) -> Result<(), Box<dyn std::error::Error>> {
    let nodes = provider.list_nodes()?;
    if nodes.is_empty() {
        println!("nodes not found");
    }
    for node in &nodes {
        println!("{}", node.name);
    }
    Ok(())
}

/// Destroying a name that is not managed, or no longer exists, is a no-op
/// so that destroy stays idempotent.
pub fn destroy_node(
    provider: &dyn CloudProvider,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !SALT_NODES.contains(&name) {
        println!("nothing to destroy: {}", name);
        return Ok(());
    }
    match provider.list_nodes()?.into_iter().find(|n| n.name == name) {
        Some(node) => {
            let destroyed = provider.destroy_node(&node)?;
            println!("{} is destroyed: {}", name, destroyed);
        }
        None => println!("nothing to destroy: {}", name),
    }
    Ok(())
}
