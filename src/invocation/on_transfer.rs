//! Ψ_T: run a service's on-transfer code over the transfers it received.

use std::collections::BTreeMap;

use crate::codec::encode_natural;
use crate::config::{PvmConfig, MAX_SERVICE_CODE_SIZE};
use crate::host_functions::args::{HostCallArgs, OnTransferArgs};
use crate::invocation::{argument_invocation, service_code};
use crate::state::{DeferredTransfer, ServiceAccount};
use crate::types::{Gas, Hash, ServiceId, TimeSlot};

/// Entry pc of the on-transfer code.
const ON_TRANSFER_PC: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnTransferOutcome {
    pub accounts: BTreeMap<ServiceId, ServiceAccount>,
    pub gas_used: Gas,
}

/// Ψ_T(d, t, s, transfers). Gas is the sum of the transfer gas limits and the balance is
/// credited with the sum of the amounts before the code runs. State changes are kept
/// whatever the outcome.
pub fn on_transfer(
    config: &PvmConfig,
    mut accounts: BTreeMap<ServiceId, ServiceAccount>,
    service_id: ServiceId,
    timeslot: TimeSlot,
    entropy: Hash,
    transfers: Vec<DeferredTransfer>,
) -> OnTransferOutcome {
    let code = accounts
        .get(&service_id)
        .and_then(ServiceAccount::code_preimage)
        .and_then(service_code)
        .filter(|code| !code.is_empty() && code.len() <= MAX_SERVICE_CODE_SIZE as usize)
        .map(<[u8]>::to_vec);
    let Some(code) = code.filter(|_| !transfers.is_empty()) else {
        return OnTransferOutcome {
            accounts,
            gas_used: 0,
        };
    };

    let gas = transfers
        .iter()
        .fold(0u64, |sum, transfer| sum.saturating_add(transfer.gas_limit));
    let amount = transfers
        .iter()
        .fold(0u64, |sum, transfer| sum.saturating_add(transfer.amount));
    if let Some(account) = accounts.get_mut(&service_id) {
        account.balance = account.balance.saturating_add(amount);
    }

    let mut argument = encode_natural(u64::from(timeslot));
    argument.extend_from_slice(&encode_natural(u64::from(service_id)));
    argument.extend_from_slice(&encode_natural(transfers.len() as u64));

    let mut args = HostCallArgs::OnTransfer(OnTransferArgs {
        service_id,
        accounts,
        timeslot,
        entropy,
        transfers,
    });
    let outcome = argument_invocation(config, &code, ON_TRANSFER_PC, gas, &argument, &mut args);
    tracing::debug!(
        target: "jam_pvm::invocation",
        service = service_id,
        gas_used = outcome.gas_used,
        result = ?outcome.result,
        "on_transfer"
    );
    let accounts = args.accounts_mut().map(std::mem::take).unwrap_or_default();
    OnTransferOutcome {
        accounts,
        gas_used: outcome.gas_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FUNC_WRITE;
    use crate::invocation::test_support::{account_with_code, HALT};

    const SERVICE: ServiceId = 12;
    /// Occupies pc 0..10 so the entry pc lands on an instruction start.
    const PAD: &[u8] = &[51, 0x02, 0, 0, 0];

    fn transfer(amount: u64, gas_limit: Gas) -> DeferredTransfer {
        DeferredTransfer {
            source: 1,
            destination: SERVICE,
            amount,
            memo: vec![0; 128],
            gas_limit,
        }
    }

    fn accounts(instructions: &[&[u8]]) -> BTreeMap<ServiceId, ServiceAccount> {
        BTreeMap::from([(SERVICE, account_with_code(instructions, 500))])
    }

    #[test]
    fn credits_and_runs() {
        // r7 = key = argument, r8 = 1 byte, r9 = value = argument, r10 = 1 byte
        let outcome = on_transfer(
            &PvmConfig::default(),
            accounts(&[
                PAD,
                PAD,
                &[51, 0x08, 1],
                &[100, 0x79],
                &[51, 0x0a, 1],
                &[10, FUNC_WRITE as u8],
                HALT,
            ]),
            SERVICE,
            7,
            [0; 32],
            vec![transfer(40, 600), transfer(2, 400)],
        );
        let account = &outcome.accounts[&SERVICE];
        assert_eq!(account.balance, 542);
        assert_eq!(account.storage.get(&vec![7]), Some(&vec![7]));
        assert_eq!(outcome.gas_used, 15);
    }

    #[test]
    fn trap_keeps_credit() {
        let outcome = on_transfer(
            &PvmConfig::default(),
            accounts(&[PAD, PAD, &[0]]),
            SERVICE,
            7,
            [0; 32],
            vec![transfer(40, 100)],
        );
        assert_eq!(outcome.accounts[&SERVICE].balance, 540);
        assert_eq!(outcome.gas_used, 1);
    }

    #[test]
    fn nothing_to_do_costs_nothing() {
        let outcome = on_transfer(
            &PvmConfig::default(),
            accounts(&[PAD, PAD, HALT]),
            SERVICE,
            7,
            [0; 32],
            Vec::new(),
        );
        assert_eq!(outcome.gas_used, 0);
        assert_eq!(outcome.accounts[&SERVICE].balance, 500);
    }
}
