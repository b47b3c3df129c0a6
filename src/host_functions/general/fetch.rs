//! FETCH host function (Ω_Y). Gray Paper: function ID 1, gas cost 10.
//! Selector in r10 (indices in r11, r12); output at r7, slice from r8 with length r9.
//! Selectors whose data the current context does not carry return NONE.

use crate::codec::{
    encode_deferred_transfer, encode_operand, encode_protocol_parameters, encode_variable_length,
    encode_variable_sequence, encode_work_context, encode_work_item_summary, encode_work_package,
};
use crate::config::{ProtocolParameters, FUNC_FETCH, REG_NONE};
use crate::host_functions::args::HostCallArgs;
use crate::host_functions::base::{HostFunction, HostFunctionContext, HostFunctionResult};
use crate::work::WorkPackage;

/// FETCH (1): selector-based read of invocation data.
pub struct FetchHostFunction;

fn index(register: u64) -> Option<usize> {
    usize::try_from(register).ok()
}

fn package_data(package: &WorkPackage, selector: u64, w11: u64) -> Option<Vec<u8>> {
    match selector {
        7 => Some(encode_work_package(package)),
        8 => {
            let mut out = package.auth_code_hash.to_vec();
            out.extend_from_slice(&encode_variable_length(&package.authorizer_config));
            Some(out)
        }
        9 => Some(package.authorization.clone()),
        10 => Some(encode_work_context(&package.context)),
        11 => {
            let summaries: Vec<Vec<u8>> = package.items.iter().map(encode_work_item_summary).collect();
            Some(encode_variable_sequence(&summaries))
        }
        12 => package.items.get(index(w11)?).map(encode_work_item_summary),
        13 => package.items.get(index(w11)?).map(|item| item.payload.clone()),
        _ => None,
    }
}

/// Value selected by `selector` in this context, or None.
#[must_use]
pub fn fetch_value(
    args: &HostCallArgs,
    params: &ProtocolParameters,
    selector: u64,
    w11: u64,
    w12: u64,
) -> Option<Vec<u8>> {
    if selector == 0 {
        return Some(encode_protocol_parameters(params));
    }
    match args {
        HostCallArgs::IsAuthorized(args) => package_data(&args.package, selector, w11),
        HostCallArgs::Refine(args) => match selector {
            2 => Some(args.auth_output.clone()),
            3 => args.extrinsics.get(index(w11)?)?.get(index(w12)?).cloned(),
            4 => args.extrinsics.get(args.item_index)?.get(index(w11)?).cloned(),
            5 => args.import_segments.get(index(w11)?)?.get(index(w12)?).cloned(),
            6 => args.import_segments.get(args.item_index)?.get(index(w11)?).cloned(),
            _ => package_data(&args.package, selector, w11),
        },
        HostCallArgs::Accumulate(args) => match selector {
            1 => Some(args.entropy.to_vec()),
            14 => {
                let operands: Vec<Vec<u8>> = args.operands.iter().map(encode_operand).collect();
                Some(encode_variable_sequence(&operands))
            }
            15 => args.operands.get(index(w11)?).map(encode_operand),
            _ => None,
        },
        HostCallArgs::OnTransfer(args) => match selector {
            1 => Some(args.entropy.to_vec()),
            16 => {
                let transfers: Vec<Vec<u8>> =
                    args.transfers.iter().map(encode_deferred_transfer).collect();
                Some(encode_variable_sequence(&transfers))
            }
            17 => args.transfers.get(index(w11)?).map(encode_deferred_transfer),
            _ => None,
        },
    }
}

impl HostFunction for FetchHostFunction {
    fn function_id(&self) -> u32 {
        FUNC_FETCH
    }
    fn name(&self) -> &'static str {
        "fetch"
    }
    fn execute(&self, context: &mut HostFunctionContext<'_>) -> HostFunctionResult {
        let output_offset = context.registers[7];
        let from_offset = context.registers[8];
        let length = context.registers[9];
        let selector = context.registers[10];

        let value = fetch_value(
            context.args,
            &context.config.params,
            selector,
            context.registers[11],
            context.registers[12],
        );
        match value {
            Some(value) => context.write_slice(&value, output_offset, from_offset, length),
            None => context.reply(REG_NONE),
        }
    }
}
