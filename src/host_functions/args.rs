//! Per-context payload threaded through the host-call loop.
//!
//! Each invocation entry point owns one variant; the variant also decides which host
//! functions are reachable from that context.

use std::collections::BTreeMap;

use crate::config::*;
use crate::host_functions::refine::NestedVm;
use crate::state::{DeferredTransfer, ResultContext, ServiceAccount};
use crate::types::{Hash, ServiceId, TimeSlot};
use crate::work::{Operand, WorkPackage};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IsAuthorizedArgs {
    pub package: WorkPackage,
    pub core: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefineArgs {
    pub core: u16,
    /// Index of the item being refined within `package.items`.
    pub item_index: usize,
    pub service_id: ServiceId,
    pub package: WorkPackage,
    pub auth_output: Vec<u8>,
    /// Imported segments per work item.
    pub import_segments: Vec<Vec<Vec<u8>>>,
    /// Extrinsic blobs per work item.
    pub extrinsics: Vec<Vec<Vec<u8>>>,
    /// Segments exported by earlier items of the package.
    pub export_offset: u64,
    pub exports: Vec<Vec<u8>>,
    pub machines: BTreeMap<u64, NestedVm>,
    pub accounts: BTreeMap<ServiceId, ServiceAccount>,
    /// Slot historical lookups are evaluated at (the lookup anchor).
    pub lookup_timeslot: TimeSlot,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulateArgs {
    /// Working context.
    pub x: ResultContext,
    /// Checkpoint, committed on panic or out-of-gas.
    pub y: ResultContext,
    pub timeslot: TimeSlot,
    pub entropy: Hash,
    pub operands: Vec<Operand>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OnTransferArgs {
    pub service_id: ServiceId,
    pub accounts: BTreeMap<ServiceId, ServiceAccount>,
    pub timeslot: TimeSlot,
    pub entropy: Hash,
    pub transfers: Vec<DeferredTransfer>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCallArgs {
    IsAuthorized(IsAuthorizedArgs),
    Refine(RefineArgs),
    Accumulate(AccumulateArgs),
    OnTransfer(OnTransferArgs),
}

impl HostCallArgs {
    /// Whether host function `id` is part of this context's operation table.
    #[must_use]
    pub const fn permits(&self, id: u32) -> bool {
        match self {
            Self::IsAuthorized(_) => matches!(id, FUNC_GAS | FUNC_FETCH | FUNC_LOG),
            Self::Refine(_) => matches!(
                id,
                FUNC_GAS
                    | FUNC_FETCH
                    | FUNC_HISTORICAL_LOOKUP
                    | FUNC_EXPORT
                    | FUNC_MACHINE
                    | FUNC_PEEK
                    | FUNC_POKE
                    | FUNC_PAGES
                    | FUNC_INVOKE
                    | FUNC_EXPUNGE
                    | FUNC_LOG
            ),
            Self::Accumulate(_) => matches!(
                id,
                FUNC_GAS
                    | FUNC_FETCH
                    | FUNC_LOOKUP
                    | FUNC_READ
                    | FUNC_WRITE
                    | FUNC_INFO
                    | FUNC_BLESS..=FUNC_PROVIDE
                    | FUNC_LOG
            ),
            Self::OnTransfer(_) => matches!(
                id,
                FUNC_GAS | FUNC_FETCH | FUNC_LOOKUP | FUNC_READ | FUNC_WRITE | FUNC_INFO | FUNC_LOG
            ),
        }
    }

    /// Service running in this context, if any.
    #[must_use]
    pub const fn service_id(&self) -> Option<ServiceId> {
        match self {
            Self::IsAuthorized(_) => None,
            Self::Refine(args) => Some(args.service_id),
            Self::Accumulate(args) => Some(args.x.service_id),
            Self::OnTransfer(args) => Some(args.service_id),
        }
    }

    /// Account state general functions read from. Accumulate sees X's copy.
    #[must_use]
    pub const fn accounts(&self) -> Option<&BTreeMap<ServiceId, ServiceAccount>> {
        match self {
            Self::IsAuthorized(_) => None,
            Self::Refine(args) => Some(&args.accounts),
            Self::Accumulate(args) => Some(&args.x.state.accounts),
            Self::OnTransfer(args) => Some(&args.accounts),
        }
    }

    pub fn accounts_mut(&mut self) -> Option<&mut BTreeMap<ServiceId, ServiceAccount>> {
        match self {
            Self::IsAuthorized(_) => None,
            Self::Refine(args) => Some(&mut args.accounts),
            Self::Accumulate(args) => Some(&mut args.x.state.accounts),
            Self::OnTransfer(args) => Some(&mut args.accounts),
        }
    }

    pub fn refine_mut(&mut self) -> Option<&mut RefineArgs> {
        match self {
            Self::Refine(args) => Some(args),
            _ => None,
        }
    }

    pub fn accumulate_mut(&mut self) -> Option<&mut AccumulateArgs> {
        match self {
            Self::Accumulate(args) => Some(args),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_tables() {
        let authorize = HostCallArgs::IsAuthorized(IsAuthorizedArgs::default());
        assert!(authorize.permits(FUNC_FETCH));
        assert!(!authorize.permits(FUNC_READ));

        let refine = HostCallArgs::Refine(RefineArgs::default());
        assert!(refine.permits(FUNC_INVOKE));
        assert!(!refine.permits(FUNC_WRITE));

        let accumulate = HostCallArgs::Accumulate(AccumulateArgs::default());
        assert!(accumulate.permits(FUNC_TRANSFER));
        assert!(accumulate.permits(FUNC_WRITE));
        assert!(!accumulate.permits(FUNC_MACHINE));

        let on_transfer = HostCallArgs::OnTransfer(OnTransferArgs::default());
        assert!(on_transfer.permits(FUNC_INFO));
        assert!(!on_transfer.permits(FUNC_NEW));
        assert!(!on_transfer.permits(27));
    }
}
