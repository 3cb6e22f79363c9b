mod sign;

use std::thread;
use std::time::Duration;

use saltctl_core::error::SaltError;
use saltctl_core::{CloudProvider, DeployRequest, Image, KeyPair, Node, ServiceOffering};
use serde::Deserialize;

const MAX_POLL_ATTEMPTS: u32 = 60;
const POLL_DELAY_SECS: u64 = 10;

/// Client for a CloudStack-compatible API endpoint (IDCF-style
/// `https://<host>/client/api`). All calls are signed blocking GETs.
pub struct CloudStack {
    api_key: String,
    secret_key: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl CloudStack {
    pub fn new(api_key: String, secret_key: String, host: String, path: &str) -> CloudStack {
        CloudStack {
            endpoint: format!("https://{}{}", host, path),
            api_key,
            secret_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn call(&self, command: &str, extra: &[(&str, String)]) -> Result<String, SaltError> {
        let mut params = vec![
            ("command".to_string(), command.to_string()),
            ("apikey".to_string(), self.api_key.clone()),
            ("response".to_string(), "json".to_string()),
        ];
        for (key, value) in extra {
            params.push((key.to_string(), value.clone()));
        }
        let query = sign::signed_query(&params, &self.secret_key);
        let url = format!("{}?{}", self.endpoint, query);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .map_err(|e| SaltError::from(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(SaltError::from(format!("API error ({}): {}", status, text)));
        }

        response
            .text()
            .map_err(|e| SaltError::from(format!("failed to read response body: {}", e)))
    }

    fn default_zone(&self) -> Result<String, SaltError> {
        let body = self.call("listZones", &[])?;
        let parsed: ListZonesResponse = parse(&body)?;
        parsed
            .listzonesresponse
            .zone
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| SaltError::from("no zones available in this account"))
    }

    /// Polls an async job until it leaves the pending state. CloudStack
    /// reports 0 while pending, 1 on success and 2 on failure.
    fn wait_for_job(&self, job_id: &str) -> Result<JobOutcome, SaltError> {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            let body = self.call("queryAsyncJobResult", &[("jobid", job_id.to_string())])?;
            let parsed: QueryJobResponse = parse(&body)?;
            let job = parsed.queryasyncjobresultresponse;
            if job.jobstatus != 0 {
                return Ok(JobOutcome {
                    succeeded: job.jobstatus == 1,
                    result: job.jobresult,
                });
            }
            if attempt < MAX_POLL_ATTEMPTS {
                thread::sleep(Duration::from_secs(POLL_DELAY_SECS));
            }
        }
        Err(SaltError::from(format!(
            "job {} did not finish after {} minutes",
            job_id,
            (MAX_POLL_ATTEMPTS as u64 * POLL_DELAY_SECS) / 60
        )))
    }
}

struct JobOutcome {
    succeeded: bool,
    result: serde_json::Value,
}

impl CloudProvider for CloudStack {
    fn list_images(&self) -> Result<Vec<Image>, SaltError> {
        let body = self.call("listTemplates", &[("templatefilter", "executable".to_string())])?;
        let parsed: ListTemplatesResponse = parse(&body)?;
        Ok(parsed
            .listtemplatesresponse
            .template
            .into_iter()
            .map(|t| Image { id: t.id, name: t.name })
            .collect())
    }

    fn list_sizes(&self) -> Result<Vec<ServiceOffering>, SaltError> {
        let body = self.call("listServiceOfferings", &[])?;
        let parsed: ListServiceOfferingsResponse = parse(&body)?;
        Ok(parsed
            .listserviceofferingsresponse
            .serviceoffering
            .into_iter()
            .map(|o| ServiceOffering { id: o.id, name: o.name })
            .collect())
    }

    fn list_key_pairs(&self) -> Result<Vec<KeyPair>, SaltError> {
        let body = self.call("listSSHKeyPairs", &[])?;
        let parsed: ListSshKeyPairsResponse = parse(&body)?;
        Ok(parsed
            .listsshkeypairsresponse
            .sshkeypair
            .into_iter()
            .map(|k| KeyPair { name: k.name })
            .collect())
    }

    fn list_nodes(&self) -> Result<Vec<Node>, SaltError> {
        let body = self.call("listVirtualMachines", &[])?;
        let parsed: ListVirtualMachinesResponse = parse(&body)?;
        Ok(parsed
            .listvirtualmachinesresponse
            .virtualmachine
            .into_iter()
            .map(VmEntry::into_node)
            .collect())
    }

    fn deploy_node(&self, request: &DeployRequest) -> Result<Node, SaltError> {
        let zone_id = self.default_zone()?;
        let body = self.call(
            "deployVirtualMachine",
            &[
                ("serviceofferingid", request.offering_id.clone()),
                ("templateid", request.image_id.clone()),
                ("zoneid", zone_id),
                ("name", request.name.clone()),
                ("displayname", request.name.clone()),
                ("keypair", request.keypair.clone()),
            ],
        )?;
        let parsed: DeployResponse = parse(&body)?;
        let outcome = self.wait_for_job(&parsed.deployvirtualmachineresponse.jobid)?;
        if !outcome.succeeded {
            return Err(SaltError::from(format!(
                "deploy of {} failed: {}",
                request.name, outcome.result
            )));
        }
        let vm: VmResult = serde_json::from_value(outcome.result)
            .map_err(|e| SaltError::from(format!("failed to parse deployed vm: {}", e)))?;
        Ok(vm.virtualmachine.into_node())
    }

    fn destroy_node(&self, node: &Node) -> Result<bool, SaltError> {
        let body = self.call("destroyVirtualMachine", &[("id", node.id.clone())])?;
        let parsed: DestroyResponse = parse(&body)?;
        let outcome = self.wait_for_job(&parsed.destroyvirtualmachineresponse.jobid)?;
        Ok(outcome.succeeded)
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, SaltError> {
    serde_json::from_str(body).map_err(|e| {
        SaltError::from(format!(
            "failed to parse response: {} - response body: {}",
            e, body
        ))
    })
}

#[derive(Deserialize)]
struct ListTemplatesResponse {
    listtemplatesresponse: TemplateList,
}

#[derive(Deserialize, Default)]
struct TemplateList {
    #[serde(default)]
    template: Vec<NamedEntry>,
}

#[derive(Deserialize)]
struct ListServiceOfferingsResponse {
    listserviceofferingsresponse: ServiceOfferingList,
}

#[derive(Deserialize, Default)]
struct ServiceOfferingList {
    #[serde(default)]
    serviceoffering: Vec<NamedEntry>,
}

#[derive(Deserialize)]
struct NamedEntry {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct ListSshKeyPairsResponse {
    listsshkeypairsresponse: SshKeyPairList,
}

#[derive(Deserialize, Default)]
struct SshKeyPairList {
    #[serde(default)]
    sshkeypair: Vec<SshKeyPairEntry>,
}

#[derive(Deserialize)]
struct SshKeyPairEntry {
    name: String,
}

#[derive(Deserialize)]
struct ListZonesResponse {
    listzonesresponse: ZoneList,
}

#[derive(Deserialize, Default)]
struct ZoneList {
    #[serde(default)]
    zone: Vec<ZoneEntry>,
}

#[derive(Deserialize)]
struct ZoneEntry {
    id: String,
}

#[derive(Deserialize)]
struct ListVirtualMachinesResponse {
    listvirtualmachinesresponse: VmList,
}

#[derive(Deserialize, Default)]
struct VmList {
    #[serde(default)]
    virtualmachine: Vec<VmEntry>,
}

#[derive(Deserialize)]
struct VmEntry {
    id: String,
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    publicip: Option<String>,
    #[serde(default)]
    nic: Vec<NicEntry>,
}

#[derive(Deserialize)]
struct NicEntry {
    #[serde(default)]
    ipaddress: Option<String>,
}

impl VmEntry {
    fn into_node(self) -> Node {
        Node {
            id: self.id,
            name: self.name,
            state: self.state,
            public_ips: self.publicip.into_iter().collect(),
            private_ips: self.nic.into_iter().filter_map(|n| n.ipaddress).collect(),
        }
    }
}

#[derive(Deserialize)]
struct VmResult {
    virtualmachine: VmEntry,
}

#[derive(Deserialize)]
struct DeployResponse {
    deployvirtualmachineresponse: JobRef,
}

#[derive(Deserialize)]
struct DestroyResponse {
    destroyvirtualmachineresponse: JobRef,
}

#[derive(Deserialize)]
struct JobRef {
    jobid: String,
}

#[derive(Debug, Deserialize)]
struct QueryJobResponse {
    queryasyncjobresultresponse: JobStatus,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    jobstatus: i32,
    #[serde(default)]
    jobresult: serde_json::Value,
}
