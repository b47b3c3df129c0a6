//! Codec (Gray Paper Appendix C serialization).
//!
//! Natural, fixed-length and variable-length encodings plus the canonical encodings of the
//! structures host calls expose to guest code.

use crate::config::{
    ProtocolParameters, C_ASSURANCE_TIMEOUT_PERIOD, C_AUTH_POOL_SIZE, C_AUTH_QUEUE_SIZE,
    C_BASE_DEPOSIT, C_BYTE_DEPOSIT, C_ITEM_DEPOSIT, C_MAX_BUNDLE_SIZE, C_MAX_PACKAGE_IMPORTS,
    C_MAX_PACKAGE_ITEMS, C_MAX_PACKAGE_XTS, C_MAX_REPORT_DEPS, C_MAX_REPORT_VAR_SIZE, C_MEMO_SIZE,
    C_RECENT_HISTORY_LEN, C_REPORT_ACC_GAS, MAX_AUTH_CODE_SIZE, MAX_PACKAGE_EXPORTS,
    MAX_SERVICE_CODE_SIZE, PACKAGE_AUTH_GAS,
};
use crate::state::{DeferredTransfer, ServiceAccount};
use crate::types::WorkExecResult;
use crate::work::{Operand, WorkContext, WorkItem, WorkPackage};

// ============================================================================
// Decoding result
// ============================================================================

/// Decoding result: value and number of bytes consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodingResult<T> {
    pub value: T,
    pub consumed: usize,
}

impl<T> DecodingResult<T> {
    #[must_use]
    pub const fn new(value: T, consumed: usize) -> Self {
        Self { value, consumed }
    }
}

/// Service code preimage split into metadata and code blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceCode<'a> {
    pub metadata: &'a [u8],
    pub code: &'a [u8],
}

// ============================================================================
// Natural number encoding (Gray Paper Eq C.1)
// ============================================================================

/// Decode natural number from variable-length encoding.
/// Returns None on truncated data.
#[must_use]
pub fn decode_natural(data: &[u8]) -> Option<DecodingResult<u64>> {
    let first = *data.first()?;
    if first == 0xff {
        let bytes = data.get(1..9)?;
        let value = bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8)));
        return Some(DecodingResult::new(value, 9));
    }

    // Number of leading one bits gives the suffix length.
    let l = first.leading_ones() as usize;
    let suffix = data.get(1..1 + l)?;
    let low_bits = suffix
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8)));
    let high_bits = (u64::from(first) & (0xffu64 >> (l + 1))) << (8 * l);
    Some(DecodingResult::new(high_bits | low_bits, 1 + l))
}

/// Encode natural number. Zero = [0x00]; values ≥ 2^56 = [0xFF, 8 bytes LE]; else prefix + suffix.
#[must_use]
pub fn encode_natural(value: u64) -> Vec<u8> {
    if value >= 1 << 56 {
        let mut out = vec![0xff];
        out.extend_from_slice(&value.to_le_bytes());
        return out;
    }

    let mut l = 0usize;
    while l < 8 && value >= 1u64 << (7 * (l + 1)) {
        l += 1;
    }
    let prefix_base = 0x100u64 - (0x100u64 >> l);
    let high_bits = value >> (8 * l);

    let mut result = Vec::with_capacity(1 + l);
    result.push((prefix_base + high_bits) as u8);
    result.extend_from_slice(&value.to_le_bytes()[..l]);
    result
}

// ============================================================================
// Fixed-length and variable-length
// ============================================================================

/// Decode fixed-length little-endian value (1–8 bytes).
#[must_use]
pub fn decode_fixed_length(data: &[u8], length: usize) -> Option<DecodingResult<u64>> {
    let bytes = data.get(..length)?;
    let value = bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (i * 8)));
    Some(DecodingResult::new(value, length))
}

/// Encode value as little-endian fixed length. Values wrap modulo 2^(8*length).
#[must_use]
pub fn encode_fixed_length(value: u64, length: usize) -> Vec<u8> {
    let mut result = vec![0u8; length];
    let bytes = value.to_le_bytes();
    let n = length.min(8);
    result[..n].copy_from_slice(&bytes[..n]);
    result
}

/// Decode variable-length term: natural(len) ‖ data.
#[must_use]
pub fn decode_variable_length(data: &[u8]) -> Option<DecodingResult<&[u8]>> {
    let length = decode_natural(data)?;
    let start = length.consumed;
    let end = start.checked_add(usize::try_from(length.value).ok()?)?;
    let value = data.get(start..end)?;
    Some(DecodingResult::new(value, end))
}

/// Encode variable-length term: natural(len) ‖ data.
#[must_use]
pub fn encode_variable_length(data: &[u8]) -> Vec<u8> {
    let mut out = encode_natural(data.len() as u64);
    out.extend_from_slice(data);
    out
}

/// Encode variable-length sequence of already-encoded elements: natural(len) ‖ e0 ‖ e1 ‖ ...
#[must_use]
pub fn encode_variable_sequence(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = encode_natural(elements.len() as u64);
    for element in elements {
        out.extend_from_slice(element);
    }
    out
}

// ============================================================================
// Service code from preimage
// ============================================================================

/// Split service code preimage: natural(|m|) ‖ m ‖ code.
#[must_use]
pub fn decode_service_code_from_preimage(preimage: &[u8]) -> Option<ServiceCode<'_>> {
    let metadata = decode_variable_length(preimage)?;
    Some(ServiceCode {
        metadata: metadata.value,
        code: &preimage[metadata.consumed..],
    })
}

// ============================================================================
// Protocol structures
// ============================================================================

/// System constants returned by FETCH selector 0, in Gray Paper order (B_I … Y).
#[must_use]
pub fn encode_protocol_parameters(params: &ProtocolParameters) -> Vec<u8> {
    let fields: [(u64, usize); 33] = [
        (C_ITEM_DEPOSIT, 8),
        (C_BYTE_DEPOSIT, 8),
        (C_BASE_DEPOSIT, 8),
        (u64::from(params.num_cores), 2),
        (u64::from(params.preimage_expunge_period), 4),
        (u64::from(params.epoch_duration), 4),
        (C_REPORT_ACC_GAS, 8),
        (PACKAGE_AUTH_GAS, 8),
        (params.max_refine_gas, 8),
        (params.max_block_gas, 8),
        (u64::from(C_RECENT_HISTORY_LEN), 2),
        (u64::from(C_MAX_PACKAGE_ITEMS), 2),
        (u64::from(C_MAX_REPORT_DEPS), 2),
        (u64::from(params.max_tickets_per_extrinsic), 2),
        (u64::from(params.max_lookup_anchorage), 4),
        (u64::from(params.tickets_per_validator), 2),
        (u64::from(C_AUTH_POOL_SIZE), 2),
        (u64::from(params.slot_duration), 2),
        (u64::from(C_AUTH_QUEUE_SIZE), 2),
        (u64::from(params.rotation_period), 2),
        (u64::from(C_MAX_PACKAGE_XTS), 2),
        (u64::from(C_ASSURANCE_TIMEOUT_PERIOD), 2),
        (u64::from(params.num_validators), 2),
        (u64::from(MAX_AUTH_CODE_SIZE), 4),
        (u64::from(C_MAX_BUNDLE_SIZE), 4),
        (u64::from(MAX_SERVICE_CODE_SIZE), 4),
        (u64::from(params.ec_piece_size), 4),
        (u64::from(C_MAX_PACKAGE_IMPORTS), 4),
        (u64::from(params.num_ec_pieces_per_segment), 4),
        (u64::from(C_MAX_REPORT_VAR_SIZE), 4),
        (C_MEMO_SIZE as u64, 4),
        (u64::from(MAX_PACKAGE_EXPORTS), 4),
        (u64::from(params.contest_duration), 4),
    ];
    let mut out = Vec::with_capacity(134);
    for (value, length) in fields {
        out.extend_from_slice(&encode_fixed_length(value, length));
    }
    out
}

/// Deferred transfer: E4(s) ‖ E4(d) ‖ E8(a) ‖ memo[128] ‖ E8(g).
#[must_use]
pub fn encode_deferred_transfer(transfer: &DeferredTransfer) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 4 + 8 + C_MEMO_SIZE + 8);
    out.extend_from_slice(&transfer.source.to_le_bytes());
    out.extend_from_slice(&transfer.destination.to_le_bytes());
    out.extend_from_slice(&transfer.amount.to_le_bytes());
    let mut memo = [0u8; C_MEMO_SIZE];
    let copy_len = transfer.memo.len().min(C_MEMO_SIZE);
    memo[..copy_len].copy_from_slice(&transfer.memo[..copy_len]);
    out.extend_from_slice(&memo);
    out.extend_from_slice(&transfer.gas_limit.to_le_bytes());
    out
}

/// Service info returned by INFO:
/// c ‖ E8(b, t, g, m, o) ‖ E4(i) ‖ E8(f) ‖ E4(r, a, p).
#[must_use]
pub fn encode_service_info(account: &ServiceAccount) -> Vec<u8> {
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(&account.code_hash);
    out.extend_from_slice(&account.balance.to_le_bytes());
    out.extend_from_slice(&account.threshold().to_le_bytes());
    out.extend_from_slice(&account.min_item_gas.to_le_bytes());
    out.extend_from_slice(&account.min_memo_gas.to_le_bytes());
    out.extend_from_slice(&account.octets().to_le_bytes());
    out.extend_from_slice(&encode_fixed_length(account.items(), 4));
    out.extend_from_slice(&account.gratis.to_le_bytes());
    out.extend_from_slice(&account.created.to_le_bytes());
    out.extend_from_slice(&account.last_accumulation.to_le_bytes());
    out.extend_from_slice(&account.parent.to_le_bytes());
    out
}

/// O(d): work result tag, with var(data) for Ok.
#[must_use]
pub fn encode_work_exec_result(result: &WorkExecResult) -> Vec<u8> {
    match result {
        WorkExecResult::Ok(data) => {
            let mut out = vec![0];
            out.extend_from_slice(&encode_variable_length(data));
            out
        }
        WorkExecResult::OutOfGas => vec![1],
        WorkExecResult::Panic => vec![2],
        WorkExecResult::BadExports => vec![3],
        WorkExecResult::Oversize => vec![4],
        WorkExecResult::BadCode => vec![5],
        WorkExecResult::CodeOversize => vec![6],
    }
}

/// Refinement context: a ‖ s ‖ b ‖ l ‖ E4(t) ‖ ↕p.
#[must_use]
pub fn encode_work_context(context: &WorkContext) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 * 32 + 4 + 1 + 32 * context.prerequisites.len());
    out.extend_from_slice(&context.anchor);
    out.extend_from_slice(&context.state_root);
    out.extend_from_slice(&context.beefy_root);
    out.extend_from_slice(&context.lookup_anchor);
    out.extend_from_slice(&context.lookup_anchor_slot.to_le_bytes());
    out.extend_from_slice(&encode_natural(context.prerequisites.len() as u64));
    for prerequisite in &context.prerequisites {
        out.extend_from_slice(prerequisite);
    }
    out
}

/// Work item: E4(s) ‖ c ‖ ↕y ‖ E8(g) ‖ E8(a) ‖ ↕imports ‖ ↕extrinsics ‖ E2(e).
#[must_use]
pub fn encode_work_item(item: &WorkItem) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&item.service.to_le_bytes());
    out.extend_from_slice(&item.code_hash);
    out.extend_from_slice(&encode_variable_length(&item.payload));
    out.extend_from_slice(&item.refine_gas_limit.to_le_bytes());
    out.extend_from_slice(&item.accumulate_gas_limit.to_le_bytes());
    out.extend_from_slice(&encode_natural(item.import_segments.len() as u64));
    for import in &item.import_segments {
        out.extend_from_slice(&import.tree_root);
        out.extend_from_slice(&import.index.to_le_bytes());
    }
    out.extend_from_slice(&encode_natural(item.extrinsics.len() as u64));
    for extrinsic in &item.extrinsics {
        out.extend_from_slice(&extrinsic.hash);
        out.extend_from_slice(&extrinsic.length.to_le_bytes());
    }
    out.extend_from_slice(&item.export_count.to_le_bytes());
    out
}

/// S(w): E4(s) ‖ c ‖ E8(g) ‖ E8(a) ‖ E2(e) ‖ E2(|i|) ‖ E2(|x|) ‖ E4(|y|).
#[must_use]
pub fn encode_work_item_summary(item: &WorkItem) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32 + 8 + 8 + 2 + 2 + 2 + 4);
    out.extend_from_slice(&item.service.to_le_bytes());
    out.extend_from_slice(&item.code_hash);
    out.extend_from_slice(&item.refine_gas_limit.to_le_bytes());
    out.extend_from_slice(&item.accumulate_gas_limit.to_le_bytes());
    out.extend_from_slice(&item.export_count.to_le_bytes());
    out.extend_from_slice(&encode_fixed_length(item.import_segments.len() as u64, 2));
    out.extend_from_slice(&encode_fixed_length(item.extrinsics.len() as u64, 2));
    out.extend_from_slice(&encode_fixed_length(item.payload.len() as u64, 4));
    out
}

/// Work package: ↕j ‖ E4(h) ‖ u ‖ ↕f ‖ context ‖ ↕items.
#[must_use]
pub fn encode_work_package(package: &WorkPackage) -> Vec<u8> {
    let mut out = encode_variable_length(&package.authorization);
    out.extend_from_slice(&package.auth_code_host.to_le_bytes());
    out.extend_from_slice(&package.auth_code_hash);
    out.extend_from_slice(&encode_variable_length(&package.authorizer_config));
    out.extend_from_slice(&encode_work_context(&package.context));
    let items: Vec<Vec<u8>> = package.items.iter().map(encode_work_item).collect();
    out.extend_from_slice(&encode_variable_sequence(&items));
    out
}

/// Accumulation operand: h ‖ e ‖ a ‖ ↕o ‖ y ‖ natural(g) ‖ O(d).
#[must_use]
pub fn encode_operand(operand: &Operand) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&operand.package_hash);
    out.extend_from_slice(&operand.segment_root);
    out.extend_from_slice(&operand.authorizer_hash);
    out.extend_from_slice(&encode_variable_length(&operand.auth_output));
    out.extend_from_slice(&operand.payload_hash);
    out.extend_from_slice(&encode_natural(operand.gas_limit));
    out.extend_from_slice(&encode_work_exec_result(&operand.result));
    out
}
