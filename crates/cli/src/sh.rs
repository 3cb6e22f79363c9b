use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

const MAX_ATTEMPTS: u32 = 30;
const RETRY_DELAY_SECS: u64 = 10;

/// Runs a shell script on a remote node by piping it to `ssh ... bash -s`.
///
/// A freshly deployed node may not accept connections yet, so connection
/// failures (ssh's own exit code 255) are retried with a fixed delay. Any
/// other non-zero exit status is an error.
pub fn run_script(
    address: &str,
    user: &str,
    key_path: &Path,
    script: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut attempt = 1;
    loop {
        let status = attempt_script(address, user, key_path, script)?;
        if status.success() {
            return Ok(());
        }
        if status.code() == Some(255) && attempt < MAX_ATTEMPTS {
            attempt += 1;
            std::thread::sleep(std::time::Duration::from_secs(RETRY_DELAY_SECS));
            continue;
        }
        return Err(format!(
            "bootstrap on {} failed with exit code: {:?}",
            address,
            status.code()
        )
        .into());
    }
}

fn attempt_script(
    address: &str,
    user: &str,
    key_path: &Path,
    script: &str,
) -> Result<ExitStatus, Box<dyn std::error::Error>> {
    let mut child = Command::new("ssh")
        .arg("-i")
        .arg(key_path)
        .arg("-o")
        .arg("StrictHostKeyChecking=no")
        .arg("-o")
        .arg("ConnectTimeout=10")
        .arg(format!("{}@{}", user, address))
        .arg("bash -s")
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start ssh: {}", e))?;

    child
        .stdin
        .as_mut()
        .ok_or("failed to open ssh stdin")?
        .write_all(script.as_bytes())
        .map_err(|e| format!("failed to send script over ssh: {}", e))?;

    child
        .wait()
        .map_err(|e| format!("failed to wait for ssh: {}", e).into())
}
