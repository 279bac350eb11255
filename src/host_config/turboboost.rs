//! Turning CPU turboboost off through the intel_pstate sysfs interface.
//!
//! Only hosts with Intel CPUs driven by intel_pstate expose the switch; other
//! hosts are left alone.

use std::sync::Arc;

use super::SubConfiguration;
use crate::{
    constants::INTEL_PSTATE_NO_TURBO,
    host::{Host, JobLevel},
    utils::error::{PerfError, Result},
};

/// Disables turboboost on a set of hosts for the duration of a test.
///
/// Does nothing unless `enabled` is set.
#[derive(Debug, Clone)]
pub struct DisableTurboboost {
    enabled: bool,
    hosts: Vec<Arc<dyn Host>>,
}

impl DisableTurboboost {
    pub fn new(enabled: bool, hosts: Vec<Arc<dyn Host>>) -> Self {
        Self { enabled, hosts }
    }

    fn is_supported(host: &dyn Host) -> Result<bool> {
        let check = host.run(&format!("ls {INTEL_PSTATE_NO_TURBO}"), JobLevel::Debug)?;
        Ok(check.passed)
    }

    fn write_no_turbo(&self, value: u8) -> Result<()> {
        for host in &self.hosts {
            if !Self::is_supported(host.as_ref())? {
                log::warn!(
                    "[{}] skipping turboboost change, {INTEL_PSTATE_NO_TURBO} is not available",
                    host.host_id()
                );
                continue;
            }

            // TODO: Remember the previous value instead of assuming turbo was on.
            let output = host.run(
                &format!("echo {value} > {INTEL_PSTATE_NO_TURBO}"),
                JobLevel::Normal,
            )?;

            if !output.passed {
                return Err(PerfError::GenericError(format!(
                    "failed to write {value} to {INTEL_PSTATE_NO_TURBO} on '{}': {}",
                    host.host_id(),
                    output.stderr.trim()
                )));
            }
        }

        Ok(())
    }
}

impl SubConfiguration for DisableTurboboost {
    fn apply(&self) -> Result<()> {
        if self.enabled {
            self.write_no_turbo(1)?;
        }

        Ok(())
    }

    fn describe(&self) -> Result<Vec<String>> {
        if !self.enabled {
            return Ok(vec![
                "configuration of turboboost through intel_pstate skipped".to_string(),
            ]);
        }

        self.hosts
            .iter()
            .map(|host| {
                Ok(if Self::is_supported(host.as_ref())? {
                    format!(
                        "turboboost disabled through intel_pstate on {}",
                        host.host_id()
                    )
                } else {
                    format!(
                        "warning: user requested to disable turboboost through intel_pstate but the sysfs file is not available on host {}",
                        host.host_id()
                    )
                })
            })
            .collect()
    }

    fn remove(&self) -> Result<()> {
        if self.enabled {
            self.write_no_turbo(0)?;
        }

        Ok(())
    }
}
