//! PVM configuration: constants, host function identifiers, sentinels and the runtime config.
//! Gray Paper specifications, Appendix A/B.

// ============================================================================
// Memory Configuration
// ============================================================================
pub const PAGE_SIZE: u32 = 4096; // 4KB - Gray Paper Cpvmpagesize (ZP)
pub const ZONE_SIZE: u32 = 65_536; // 64KB - Gray Paper Cpvminitzonesize (ZZ)
pub const INIT_INPUT_SIZE: u32 = 16_777_216; // 16MB (2^24) - Gray Paper Cpvminitinputsize (ZI)
pub const DYNAMIC_ADDRESS_ALIGNMENT: u64 = 2; // Gray Paper Cpvmdynaddralign (ZA)
/// Number of pages in the 32-bit address space.
pub const PAGE_COUNT: u64 = (1u64 << 32) / PAGE_SIZE as u64;
/// Pages below this index are never accessible (the first zone). Used by PAGES.
pub const MIN_MUTABLE_PAGE: u64 = 16;

// ============================================================================
// Register Initialization Constants (Gray Paper equation 803-811)
// ============================================================================
pub const REGISTER_COUNT: usize = 13;
/// r0: HALT address - jumping here causes PVM to halt. Gray Paper: 2^32 - 2^16 = 0xffff0000
pub const HALT_ADDRESS: u32 = 4_294_901_760;
/// r1: Stack segment end (exclusive). Gray Paper: 2^32 - 2*Cpvminitzonesize - Cpvminitinputsize
pub const STACK_SEGMENT_END: u32 = 4_278_059_008; // 0xFEFE0000
/// r7: Arguments segment start. Gray Paper: 2^32 - Cpvminitzonesize - Cpvminitinputsize
pub const ARGS_SEGMENT_START: u32 = 4_278_124_544; // 0xFEFF0000

// ============================================================================
// Instruction decoding
// ============================================================================
/// Upper bound of Fskip (Gray Paper eq A.3).
pub const MAX_SKIP: usize = 24;

// ============================================================================
// Inner machine status codes (Gray Paper Ω_K)
// ============================================================================
pub const RESULT_CODE_HALT: u64 = 0;
pub const RESULT_CODE_PANIC: u64 = 1;
pub const RESULT_CODE_FAULT: u64 = 2;
pub const RESULT_CODE_HOST: u64 = 3;
pub const RESULT_CODE_OOG: u64 = 4;

// ============================================================================
// Gray Paper Constants
// ============================================================================
pub const PACKAGE_AUTH_GAS: u64 = 50_000_000;
pub const MAX_AUTH_CODE_SIZE: u32 = 64_000;
pub const PACKAGE_REF_GAS: u64 = 5_000_000_000;
pub const MAX_SERVICE_CODE_SIZE: u32 = 4_000_000;
pub const SEGMENT_SIZE: u32 = 4_104;
pub const MAX_PACKAGE_EXPORTS: u32 = 3_072;
pub const MIN_PUBLIC_INDEX: u32 = 65_536;
pub const VALIDATOR_KEY_SIZE: usize = 336;

// Deposit (DEPOSIT_CONSTANTS)
pub const C_ITEM_DEPOSIT: u64 = 10;
pub const C_BYTE_DEPOSIT: u64 = 1;
pub const C_BASE_DEPOSIT: u64 = 100;
/// Per-lookup footprint overhead: octets += 81 + z for each (h, z) request.
pub const LOOKUP_OCTETS_BASE: u64 = 81;
/// Per-storage-item footprint overhead: octets += 34 + |k| + |v|.
pub const STORAGE_OCTETS_BASE: u64 = 34;

// Work report (WORK_REPORT_CONSTANTS)
pub const C_REPORT_ACC_GAS: u64 = 10_000_000;
pub const C_MAX_REPORT_DEPS: u32 = 8;
pub const C_MAX_REPORT_VAR_SIZE: u32 = 49152; // 48 * 2^10

// Authorization (AUTHORIZATION_CONSTANTS)
pub const C_AUTH_POOL_SIZE: u32 = 8;
pub const C_AUTH_QUEUE_SIZE: u32 = 80;

// Work package (WORK_PACKAGE_CONSTANTS)
pub const C_MAX_PACKAGE_ITEMS: u32 = 16;
pub const C_MAX_PACKAGE_XTS: u32 = 128;
pub const C_MAX_PACKAGE_IMPORTS: u32 = 3072;
pub const C_MAX_BUNDLE_SIZE: u32 = 13_791_360;

// Time (TIME_CONSTANTS)
pub const C_ROTATION_PERIOD: u32 = 10;
pub const C_ASSURANCE_TIMEOUT_PERIOD: u32 = 5;
pub const C_EXPUNGE_PERIOD: u32 = 19200;
pub const C_MAX_LOOKUP_ANCHORAGE: u32 = 14400;

// History (HISTORY_CONSTANTS)
pub const C_RECENT_HISTORY_LEN: u32 = 8;

// Segment (SEGMENT_CONSTANTS)
pub const C_EC_PIECE_SIZE: u32 = 684;
pub const C_SEGMENT_EC_PIECES: u32 = 6;

// Transfer (TRANSFER_CONSTANTS)
pub const C_MEMO_SIZE: usize = 128;

// Ticket (TICKET_CONSTANTS)
pub const C_MAX_BLOCK_TICKETS: u32 = 16;
pub const C_TICKET_ENTRIES: u32 = 2;
pub const C_EPOCH_TAIL_START: u32 = 500;

// ============================================================================
// Host Function Identifiers (Gray Paper Appendix B.7)
// ============================================================================
pub const FUNC_GAS: u32 = 0;
pub const FUNC_FETCH: u32 = 1;
pub const FUNC_LOOKUP: u32 = 2;
pub const FUNC_READ: u32 = 3;
pub const FUNC_WRITE: u32 = 4;
pub const FUNC_INFO: u32 = 5;
pub const FUNC_HISTORICAL_LOOKUP: u32 = 6;
pub const FUNC_EXPORT: u32 = 7;
pub const FUNC_MACHINE: u32 = 8;
pub const FUNC_PEEK: u32 = 9;
pub const FUNC_POKE: u32 = 10;
pub const FUNC_PAGES: u32 = 11;
pub const FUNC_INVOKE: u32 = 12;
pub const FUNC_EXPUNGE: u32 = 13;
pub const FUNC_BLESS: u32 = 14;
pub const FUNC_ASSIGN: u32 = 15;
pub const FUNC_DESIGNATE: u32 = 16;
pub const FUNC_CHECKPOINT: u32 = 17;
pub const FUNC_NEW: u32 = 18;
pub const FUNC_UPGRADE: u32 = 19;
pub const FUNC_TRANSFER: u32 = 20;
pub const FUNC_EJECT: u32 = 21;
pub const FUNC_QUERY: u32 = 22;
pub const FUNC_SOLICIT: u32 = 23;
pub const FUNC_FORGET: u32 = 24;
pub const FUNC_YIELD: u32 = 25;
pub const FUNC_PROVIDE: u32 = 26;
pub const FUNC_LOG: u32 = 100;

/// Base gas charged by every host function before it runs.
pub const HOST_CALL_BASE_GAS: u64 = 10;

// ============================================================================
// Host call sentinels written to registers[7] (Gray Paper section B.1)
// ============================================================================
pub const REG_NONE: u64 = u64::MAX; // 2^64 - 1
pub const REG_WHAT: u64 = u64::MAX - 1; // 2^64 - 2
pub const REG_OOB: u64 = u64::MAX - 2; // 2^64 - 3
pub const REG_WHO: u64 = u64::MAX - 3; // 2^64 - 4
pub const REG_FULL: u64 = u64::MAX - 4; // 2^64 - 5
pub const REG_CORE: u64 = u64::MAX - 5; // 2^64 - 6
pub const REG_CASH: u64 = u64::MAX - 6; // 2^64 - 7
pub const REG_LOW: u64 = u64::MAX - 7; // 2^64 - 8
pub const REG_HUH: u64 = u64::MAX - 8; // 2^64 - 9
pub const REG_OK: u64 = 0;

// ============================================================================
// Runtime configuration
// ============================================================================

/// How instructions are billed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GasMode {
    /// One unit per executed instruction.
    #[default]
    PerInstruction,
    /// Whole basic blocks billed up front from the pipeline simulator.
    BlockBased,
}

/// Version of the per-opcode resource table used by block-based billing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CostModel {
    #[default]
    V1,
}

/// Chain parameters. Encoded by FETCH selector 0 and used by ASSIGN, DESIGNATE and friends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolParameters {
    pub num_cores: u32,
    pub preimage_expunge_period: u32,
    pub epoch_duration: u32,
    pub max_refine_gas: u64,
    pub max_block_gas: u64,
    pub max_tickets_per_extrinsic: u32,
    pub max_lookup_anchorage: u32,
    pub tickets_per_validator: u32,
    pub slot_duration: u32,
    pub rotation_period: u32,
    pub num_validators: u32,
    pub ec_piece_size: u32,
    pub num_ec_pieces_per_segment: u32,
    pub contest_duration: u32,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            num_cores: 341,
            preimage_expunge_period: C_EXPUNGE_PERIOD,
            epoch_duration: 600,
            max_refine_gas: PACKAGE_REF_GAS,
            max_block_gas: 3_500_000_000,
            max_tickets_per_extrinsic: C_MAX_BLOCK_TICKETS,
            max_lookup_anchorage: C_MAX_LOOKUP_ANCHORAGE,
            tickets_per_validator: C_TICKET_ENTRIES,
            slot_duration: 6,
            rotation_period: C_ROTATION_PERIOD,
            num_validators: 1023,
            ec_piece_size: C_EC_PIECE_SIZE,
            num_ec_pieces_per_segment: C_SEGMENT_EC_PIECES,
            contest_duration: C_EPOCH_TAIL_START,
        }
    }
}

impl ProtocolParameters {
    /// Small chain used by tests: 2 cores, 6 validators.
    #[must_use]
    pub fn tiny() -> Self {
        Self {
            num_cores: 2,
            epoch_duration: 12,
            num_validators: 6,
            contest_duration: 10,
            rotation_period: 4,
            max_tickets_per_extrinsic: 3,
            tickets_per_validator: 3,
            ec_piece_size: 4,
            num_ec_pieces_per_segment: 1026,
            ..Self::default()
        }
    }
}

/// Configuration threaded through every invocation entry point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PvmConfig {
    pub gas_mode: GasMode,
    pub cost_model: CostModel,
    pub params: ProtocolParameters,
}

impl PvmConfig {
    #[must_use]
    pub fn block_based() -> Self {
        Self {
            gas_mode: GasMode::BlockBased,
            ..Self::default()
        }
    }
}

// ============================================================================
// Alignment helpers (Gray Paper equation 766)
// ============================================================================

/// Align size to page boundary: PAGE_SIZE * ceil(size / PAGE_SIZE).
#[must_use]
pub const fn align_to_page(size: u64) -> u64 {
    let page = PAGE_SIZE as u64;
    size.div_ceil(page) * page
}

/// Align size to zone boundary: ZONE_SIZE * ceil(size / ZONE_SIZE).
#[must_use]
pub const fn align_to_zone(size: u64) -> u64 {
    let zone = ZONE_SIZE as u64;
    size.div_ceil(zone) * zone
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants_agree() {
        let top = 1u64 << 32;
        assert_eq!(u64::from(HALT_ADDRESS), top - (1 << 16));
        assert_eq!(
            u64::from(STACK_SEGMENT_END),
            top - 2 * u64::from(ZONE_SIZE) - u64::from(INIT_INPUT_SIZE)
        );
        assert_eq!(
            u64::from(ARGS_SEGMENT_START),
            top - u64::from(ZONE_SIZE) - u64::from(INIT_INPUT_SIZE)
        );
    }

    #[test]
    fn alignment() {
        assert_eq!(align_to_page(0), 0);
        assert_eq!(align_to_page(1), 4096);
        assert_eq!(align_to_page(4096), 4096);
        assert_eq!(align_to_zone(65_537), 131_072);
    }
}
