//! Host functions and the host-call loop (Gray Paper Ψ_H).
//!
//! [`host_call_loop`] runs the engine and services each ECALLI from the combined registry,
//! filtered by the operation table of the current [`HostCallArgs`] variant.

pub mod accumulate;
pub mod args;
pub mod base;
pub mod general;
pub mod refine;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::config::{PvmConfig, HOST_CALL_BASE_GAS, REG_WHAT};
use crate::gas::charge;
use crate::host_functions::base::{HostFunction, HostFunctionContext};
use crate::pvm::Pvm;
use crate::types::ExitReason;

pub use args::HostCallArgs;

/// Combined host function registry (general + accumulate).
fn get_combined_registry() -> &'static HashMap<u32, Box<dyn HostFunction>> {
    static REGISTRY: OnceLock<HashMap<u32, Box<dyn HostFunction>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut m = general::create_general_registry();
        for (id, h) in accumulate::create_accumulate_registry() {
            m.insert(id, h);
        }
        m
    })
}

/// Look up a host function by ID.
pub fn get_host_function(host_call_id: u32) -> Option<&'static dyn HostFunction> {
    get_combined_registry()
        .get(&host_call_id)
        .map(|b| b.as_ref() as &dyn HostFunction)
}

/// Service one host call. Returns `Continue` to resume the guest.
pub fn dispatch_host_call(
    pvm: &mut Pvm,
    config: &PvmConfig,
    args: &mut HostCallArgs,
    id: u32,
) -> ExitReason {
    let Some(function) = get_host_function(id).filter(|_| args.permits(id)) else {
        if !charge(&mut pvm.gas, HOST_CALL_BASE_GAS) {
            return ExitReason::OutOfGas;
        }
        crate::host_log_error!("[hostfn] unknown host call {} -> WHAT", id);
        pvm.registers[7] = REG_WHAT;
        return ExitReason::Continue;
    };
    if !charge(&mut pvm.gas, function.gas_cost(&pvm.registers)) {
        return ExitReason::OutOfGas;
    }
    crate::host_log!("[hostfn] {} (gas left {})", function.name(), pvm.gas);
    let mut context = HostFunctionContext {
        registers: &mut pvm.registers,
        memory: &mut pvm.memory,
        gas: &mut pvm.gas,
        config,
        args,
    };
    function.execute(&mut context).exit
}

/// Ψ_H: run until a terminal exit, servicing host calls in between.
pub fn host_call_loop(pvm: &mut Pvm, config: &PvmConfig, args: &mut HostCallArgs) -> ExitReason {
    loop {
        let exit = match pvm.run(config) {
            ExitReason::HostCall(id) => dispatch_host_call(pvm, config, args, id),
            other => return other,
        };
        if exit != ExitReason::Continue {
            return exit;
        }
    }
}
