//! Work package model (Gray Paper §14.3) as seen by the authorization and refine entry points,
//! plus the accumulation operand built from a work result.

use crate::codec::encode_work_package;
use crate::crypto::blake2b256;
use crate::types::{Gas, Hash, ServiceId, TimeSlot, WorkExecResult};

/// Imported segment reference: segments-tree root and segment index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSpec {
    pub tree_root: Hash,
    pub index: u16,
}

/// Extrinsic reference: blob hash and length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtrinsicSpec {
    pub hash: Hash,
    pub length: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkItem {
    pub service: ServiceId,
    pub code_hash: Hash,
    pub payload: Vec<u8>,
    pub refine_gas_limit: Gas,
    pub accumulate_gas_limit: Gas,
    pub import_segments: Vec<ImportSpec>,
    pub extrinsics: Vec<ExtrinsicSpec>,
    pub export_count: u16,
}

/// Refinement context (Gray Paper X).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkContext {
    pub anchor: Hash,
    pub state_root: Hash,
    pub beefy_root: Hash,
    pub lookup_anchor: Hash,
    pub lookup_anchor_slot: TimeSlot,
    pub prerequisites: Vec<Hash>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkPackage {
    /// Authorization token (j).
    pub authorization: Vec<u8>,
    /// Service holding the authorizer code (h).
    pub auth_code_host: ServiceId,
    pub auth_code_hash: Hash,
    pub authorizer_config: Vec<u8>,
    pub context: WorkContext,
    pub items: Vec<WorkItem>,
}

impl WorkPackage {
    /// H(E(p)), the package hash passed to refine.
    #[must_use]
    pub fn hash(&self) -> Hash {
        blake2b256(&encode_work_package(self))
    }
}

/// Accumulation operand (Gray Paper O): one work result plus its package context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    pub package_hash: Hash,
    pub segment_root: Hash,
    pub authorizer_hash: Hash,
    pub payload_hash: Hash,
    pub gas_limit: Gas,
    pub result: WorkExecResult,
    pub auth_output: Vec<u8>,
}

impl Default for Operand {
    fn default() -> Self {
        Self {
            package_hash: [0; 32],
            segment_root: [0; 32],
            authorizer_hash: [0; 32],
            payload_hash: [0; 32],
            gas_limit: 0,
            result: WorkExecResult::Ok(Vec::new()),
            auth_output: Vec::new(),
        }
    }
}
