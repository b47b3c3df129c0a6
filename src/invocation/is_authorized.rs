//! Ψ_I: run the package's authorizer on a core.

use std::collections::BTreeMap;

use crate::codec::encode_fixed_length;
use crate::config::{PvmConfig, MAX_AUTH_CODE_SIZE, PACKAGE_AUTH_GAS};
use crate::host_functions::args::{HostCallArgs, IsAuthorizedArgs};
use crate::invocation::{argument_invocation, service_code};
use crate::state::ServiceAccount;
use crate::types::{Gas, ServiceId, WorkExecResult};
use crate::work::WorkPackage;

/// Authorizer output on success, or the reason there is none.
pub type IsAuthorizedResult = WorkExecResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsAuthorizedOutcome {
    pub result: IsAuthorizedResult,
    pub gas_used: Gas,
}

/// Authorizer code as of the lookup-anchor slot, fetched from the package's auth host.
fn authorizer_code<'a>(
    package: &WorkPackage,
    accounts: &'a BTreeMap<ServiceId, ServiceAccount>,
) -> Option<&'a [u8]> {
    let host = accounts.get(&package.auth_code_host)?;
    let preimage = host.historical_lookup(package.context.lookup_anchor_slot, &package.auth_code_hash)?;
    service_code(preimage)
}

/// Ψ_I(p, c). The argument is E2(c); execution starts at pc 0 with the package auth gas.
pub fn is_authorized(
    config: &PvmConfig,
    package: &WorkPackage,
    core: u16,
    accounts: &BTreeMap<ServiceId, ServiceAccount>,
) -> IsAuthorizedOutcome {
    let Some(code) = authorizer_code(package, accounts) else {
        return IsAuthorizedOutcome {
            result: WorkExecResult::BadCode,
            gas_used: 0,
        };
    };
    if code.len() > MAX_AUTH_CODE_SIZE as usize {
        return IsAuthorizedOutcome {
            result: WorkExecResult::CodeOversize,
            gas_used: 0,
        };
    }

    let mut args = HostCallArgs::IsAuthorized(IsAuthorizedArgs {
        package: package.clone(),
        core,
    });
    let argument = encode_fixed_length(u64::from(core), 2);
    let outcome = argument_invocation(config, code, 0, PACKAGE_AUTH_GAS, &argument, &mut args);
    tracing::debug!(target: "jam_pvm::invocation", core, gas_used = outcome.gas_used, ok = outcome.result.is_ok(), "is_authorized");
    IsAuthorizedOutcome {
        result: outcome.result.into(),
        gas_used: outcome.gas_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::test_support::{account_with_code, code_preimage, HALT};

    fn setup(instructions: &[&[u8]]) -> (WorkPackage, BTreeMap<ServiceId, ServiceAccount>) {
        let account = account_with_code(instructions, 0);
        let mut package = WorkPackage {
            auth_code_host: 9,
            auth_code_hash: account.code_hash,
            ..WorkPackage::default()
        };
        package.context.lookup_anchor_slot = 10;
        (package, BTreeMap::from([(9, account)]))
    }

    #[test]
    fn authorizer_output_is_returned() {
        let (package, accounts) = setup(&[HALT]);
        let outcome = is_authorized(&PvmConfig::default(), &package, 1, &accounts);
        assert_eq!(outcome.result, WorkExecResult::Ok(vec![1, 0]));
        assert_eq!(outcome.gas_used, 1);
    }

    #[test]
    fn missing_or_unavailable_code_is_bad_code() {
        let (mut package, accounts) = setup(&[HALT]);
        package.context.lookup_anchor_slot = 0;
        let outcome = is_authorized(&PvmConfig::default(), &package, 0, &accounts);
        assert_eq!(outcome.result, WorkExecResult::BadCode);

        package.auth_code_hash = code_preimage(&[&[0]]).0;
        package.context.lookup_anchor_slot = 10;
        let outcome = is_authorized(&PvmConfig::default(), &package, 0, &accounts);
        assert_eq!(outcome.result, WorkExecResult::BadCode);
        assert_eq!(outcome.gas_used, 0);
    }

    #[test]
    fn trap_is_panic() {
        let (package, accounts) = setup(&[&[0]]);
        let outcome = is_authorized(&PvmConfig::default(), &package, 0, &accounts);
        assert_eq!(outcome.result, WorkExecResult::Panic);
    }
}
