pub mod error;

use error::SaltError;

/// Provider-side operations the CLI needs. Implemented by the CloudStack
/// client; tests substitute a recording fake.
pub trait CloudProvider {
    fn list_images(&self) -> Result<Vec<Image>, SaltError>;
    fn list_sizes(&self) -> Result<Vec<ServiceOffering>, SaltError>;
    fn list_key_pairs(&self) -> Result<Vec<KeyPair>, SaltError>;
    fn list_nodes(&self) -> Result<Vec<Node>, SaltError>;
    fn deploy_node(&self, request: &DeployRequest) -> Result<Node, SaltError>;
    fn destroy_node(&self, node: &Node) -> Result<bool, SaltError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPair {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub state: String,
    pub public_ips: Vec<String>,
    pub private_ips: Vec<String>,
}

/// Which network interface to reach a node on for SSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SshInterface {
    Private,
    Public,
}

impl Node {
    /// Address to reach the node on, preferring the requested interface and
    /// falling back to the other one if it has no address there.
    pub fn ssh_address(&self, interface: SshInterface) -> Option<&str> {
        let (preferred, fallback) = match interface {
            SshInterface::Private => (&self.private_ips, &self.public_ips),
            SshInterface::Public => (&self.public_ips, &self.private_ips),
        };
        preferred
            .first()
            .or_else(|| fallback.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub name: String,
    pub image_id: String,
    pub offering_id: String,
    pub keypair: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(private: &[&str], public: &[&str]) -> Node {
        Node {
            id: "vm-1".to_string(),
            name: "salt".to_string(),
            state: "Running".to_string(),
            public_ips: public.iter().map(|s| s.to_string()).collect(),
            private_ips: private.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn ssh_address_prefers_requested_interface() {
        let n = node(&["10.0.0.5"], &["203.0.113.9"]);
        assert_eq!(n.ssh_address(SshInterface::Private), Some("10.0.0.5"));
        assert_eq!(n.ssh_address(SshInterface::Public), Some("203.0.113.9"));
    }

    #[test]
    fn ssh_address_falls_back_to_other_interface() {
        let n = node(&[], &["203.0.113.9"]);
        assert_eq!(n.ssh_address(SshInterface::Private), Some("203.0.113.9"));
    }

    #[test]
    fn ssh_address_none_when_no_addresses() {
        let n = node(&[], &[]);
        assert_eq!(n.ssh_address(SshInterface::Private), None);
    }
}
