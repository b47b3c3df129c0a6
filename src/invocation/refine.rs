//! Ψ_R: refine one work item of a package.

use crate::codec::{encode_natural, encode_variable_length};
use crate::config::{PvmConfig, MAX_SERVICE_CODE_SIZE, SEGMENT_SIZE};
use crate::host_functions::args::{HostCallArgs, RefineArgs};
use crate::invocation::{argument_invocation, service_code};
use crate::types::{Gas, WorkExecResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefineOutcome {
    pub result: WorkExecResult,
    pub gas_used: Gas,
    /// Exported segments. On failure, `export_count` zero segments.
    pub exports: Vec<Vec<u8>>,
}

impl RefineOutcome {
    fn failed(result: WorkExecResult, gas_used: Gas, export_count: u16) -> Self {
        Self {
            result,
            gas_used,
            exports: vec![vec![0; SEGMENT_SIZE as usize]; usize::from(export_count)],
        }
    }
}

/// Ψ_R for item `args.item_index` of `args.package`.
///
/// The service and lookup slot are taken from the item and the package context; `exports`
/// and `machines` start empty. Code is resolved by historical lookup at the anchor slot.
pub fn refine(config: &PvmConfig, mut args: RefineArgs) -> RefineOutcome {
    let Some(item) = args.package.items.get(args.item_index).cloned() else {
        return RefineOutcome::failed(WorkExecResult::BadCode, 0, 0);
    };
    args.service_id = item.service;
    args.lookup_timeslot = args.package.context.lookup_anchor_slot;
    args.exports.clear();
    args.machines.clear();

    let code = args
        .accounts
        .get(&item.service)
        .and_then(|account| account.historical_lookup(args.lookup_timeslot, &item.code_hash))
        .and_then(service_code)
        .map(<[u8]>::to_vec);
    let Some(code) = code else {
        return RefineOutcome::failed(WorkExecResult::BadCode, 0, item.export_count);
    };
    if code.len() > MAX_SERVICE_CODE_SIZE as usize {
        return RefineOutcome::failed(WorkExecResult::CodeOversize, 0, item.export_count);
    }

    let mut argument = encode_natural(u64::from(args.core));
    argument.extend_from_slice(&encode_natural(args.item_index as u64));
    argument.extend_from_slice(&encode_natural(u64::from(item.service)));
    argument.extend_from_slice(&encode_variable_length(&item.payload));
    argument.extend_from_slice(&args.package.hash());

    let mut args = HostCallArgs::Refine(args);
    let outcome = argument_invocation(config, &code, 0, item.refine_gas_limit, &argument, &mut args);
    let exports = args
        .refine_mut()
        .map(|refine| std::mem::take(&mut refine.exports))
        .unwrap_or_default();
    tracing::debug!(
        target: "jam_pvm::invocation",
        service = item.service,
        gas_used = outcome.gas_used,
        exports = exports.len(),
        "refine"
    );

    let result = WorkExecResult::from(outcome.result);
    if !matches!(result, WorkExecResult::Ok(_)) {
        return RefineOutcome::failed(result, outcome.gas_used, item.export_count);
    }
    if exports.len() != usize::from(item.export_count) {
        return RefineOutcome::failed(WorkExecResult::BadExports, outcome.gas_used, item.export_count);
    }
    RefineOutcome {
        result,
        gas_used: outcome.gas_used,
        exports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FUNC_EXPORT;
    use crate::invocation::test_support::{account_with_code, HALT};
    use crate::work::{WorkItem, WorkPackage};

    fn setup(instructions: &[&[u8]], export_count: u16) -> RefineArgs {
        let account = account_with_code(instructions, 0);
        let mut package = WorkPackage::default();
        package.context.lookup_anchor_slot = 5;
        package.items.push(WorkItem {
            service: 4,
            code_hash: account.code_hash,
            payload: vec![0xaa],
            refine_gas_limit: 1_000,
            export_count,
            ..WorkItem::default()
        });
        let mut args = RefineArgs {
            core: 1,
            package,
            ..RefineArgs::default()
        };
        args.accounts.insert(4, account);
        args
    }

    #[test]
    fn halt_returns_argument() {
        let args = setup(&[HALT], 0);
        let package_hash = args.package.hash();
        let outcome = refine(&PvmConfig::default(), args);
        let mut expected = vec![1, 0, 4, 1, 0xaa];
        expected.extend_from_slice(&package_hash);
        assert_eq!(outcome.result, WorkExecResult::Ok(expected));
        assert!(outcome.exports.is_empty());
    }

    #[test]
    fn export_count_must_match() {
        let outcome = refine(&PvmConfig::default(), setup(&[HALT], 2));
        assert_eq!(outcome.result, WorkExecResult::BadExports);
        assert_eq!(outcome.exports, vec![vec![0; SEGMENT_SIZE as usize]; 2]);

        // ecalli export with r7 = argument pointer, r8 = 1 ; jump_ind r0
        let mut args = setup(&[&[51, 0x08, 1], &[10, FUNC_EXPORT as u8], HALT], 1);
        args.export_offset = 3;
        let outcome = refine(&PvmConfig::default(), args);
        assert!(matches!(outcome.result, WorkExecResult::Ok(_)));
        assert_eq!(outcome.exports.len(), 1);
        assert_eq!(outcome.exports[0].len(), SEGMENT_SIZE as usize);
        assert_eq!(outcome.exports[0][0], 1);
    }

    #[test]
    fn missing_code_is_bad_code() {
        let mut args = setup(&[HALT], 1);
        args.accounts.clear();
        let outcome = refine(&PvmConfig::default(), args);
        assert_eq!(outcome.result, WorkExecResult::BadCode);
        assert_eq!(outcome.gas_used, 0);
        assert_eq!(outcome.exports.len(), 1);
    }
}
