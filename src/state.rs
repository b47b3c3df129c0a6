//! Service accounts, partial state and the accumulation result context (Gray Paper §9, §12, B.5).

use crate::codec::{decode_fixed_length, encode_fixed_length};
use crate::config::{
    C_BASE_DEPOSIT, C_BYTE_DEPOSIT, C_ITEM_DEPOSIT, LOOKUP_OCTETS_BASE, MIN_PUBLIC_INDEX,
    STORAGE_OCTETS_BASE, VALIDATOR_KEY_SIZE,
};
use crate::crypto::blake2b256;
use crate::types::{Gas, Hash, ServiceId, TimeSlot};
use std::collections::{BTreeMap, BTreeSet};

/// Validator key set entry (336 bytes).
pub type ValidatorKey = [u8; VALIDATOR_KEY_SIZE];

/// Service account (Gray Paper δ[s]). Items, octets and threshold are derived.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceAccount {
    pub code_hash: Hash,
    pub balance: u64,
    /// Minimum gas per accumulated item (a_g).
    pub min_item_gas: Gas,
    /// Minimum gas per on-transfer memo (a_m).
    pub min_memo_gas: Gas,
    pub gratis: u64,
    pub created: TimeSlot,
    pub last_accumulation: TimeSlot,
    pub parent: ServiceId,
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
    pub preimages: BTreeMap<Hash, Vec<u8>>,
    /// Preimage requests keyed by (hash, length); value is the availability timeslots.
    pub lookups: BTreeMap<(Hash, u32), Vec<TimeSlot>>,
}

impl ServiceAccount {
    /// a_i = 2·|a_l| + |a_s|
    #[must_use]
    pub fn items(&self) -> u64 {
        2 * self.lookups.len() as u64 + self.storage.len() as u64
    }

    /// a_o = Σ(81 + z) over requests + Σ(34 + |k| + |v|) over storage.
    #[must_use]
    pub fn octets(&self) -> u64 {
        let lookups: u64 = self
            .lookups
            .keys()
            .map(|(_, length)| LOOKUP_OCTETS_BASE + u64::from(*length))
            .sum();
        let storage: u64 = self
            .storage
            .iter()
            .map(|(k, v)| STORAGE_OCTETS_BASE + k.len() as u64 + v.len() as u64)
            .sum();
        lookups + storage
    }

    /// a_t: minimum balance the account must hold.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        Self::threshold_for(self.items(), self.octets(), self.gratis)
    }

    #[must_use]
    pub fn threshold_for(items: u64, octets: u64, gratis: u64) -> u64 {
        C_BASE_DEPOSIT
            .saturating_add(C_ITEM_DEPOSIT.saturating_mul(items))
            .saturating_add(C_BYTE_DEPOSIT.saturating_mul(octets))
            .saturating_sub(gratis)
    }

    /// Threshold the account would have after setting (Some) or deleting (None) a storage key.
    #[must_use]
    pub fn threshold_after_write(&self, key: &[u8], value: Option<&[u8]>) -> u64 {
        let mut items = self.items();
        let mut octets = self.octets();
        if let Some(previous) = self.storage.get(key) {
            items -= 1;
            octets -= STORAGE_OCTETS_BASE + key.len() as u64 + previous.len() as u64;
        }
        if let Some(value) = value {
            items += 1;
            octets += STORAGE_OCTETS_BASE + key.len() as u64 + value.len() as u64;
        }
        Self::threshold_for(items, octets, self.gratis)
    }

    /// Threshold after adding one (hash, length) request.
    #[must_use]
    pub fn threshold_after_request(&self, length: u32) -> u64 {
        Self::threshold_for(
            self.items() + 2,
            self.octets() + LOOKUP_OCTETS_BASE + u64::from(length),
            self.gratis,
        )
    }

    /// Preimage holding this account's code (metadata prefix included).
    #[must_use]
    pub fn code_preimage(&self) -> Option<&[u8]> {
        self.preimages.get(&self.code_hash).map(Vec::as_slice)
    }

    /// Λ(a, t, h): the preimage of `hash` if it was available at `timeslot`.
    #[must_use]
    pub fn historical_lookup(&self, timeslot: TimeSlot, hash: &Hash) -> Option<&[u8]> {
        let preimage = self.preimages.get(hash)?;
        let length = u32::try_from(preimage.len()).ok()?;
        let slots = self.lookups.get(&(*hash, length))?;
        is_available(slots, timeslot).then_some(preimage.as_slice())
    }
}

/// I(l, t): whether a request history marks the preimage available at `t`.
#[must_use]
pub fn is_available(slots: &[TimeSlot], t: TimeSlot) -> bool {
    match *slots {
        [x] => x <= t,
        [x, y] => x <= t && t < y,
        [x, y, z] => (x <= t && t < y) || z <= t,
        _ => false,
    }
}

/// Deferred transfer (Gray Paper eq 12.14): source, destination, amount, memo (128), gas limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeferredTransfer {
    pub source: ServiceId,
    pub destination: ServiceId,
    pub amount: u64,
    pub memo: Vec<u8>,
    pub gas_limit: Gas,
}

/// Partial state visible to accumulation (Gray Paper partialstate).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialState {
    pub accounts: BTreeMap<ServiceId, ServiceAccount>,
    pub staging_set: Vec<ValidatorKey>,
    pub auth_queue: Vec<Vec<Hash>>,
    pub manager: ServiceId,
    pub assigners: Vec<ServiceId>,
    pub delegator: ServiceId,
    pub always_accumulate: BTreeMap<ServiceId, Gas>,
}

/// Accumulation result context (Gray Paper L: implications). X is working, Y the checkpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultContext {
    pub service_id: ServiceId,
    pub state: PartialState,
    /// Probe id for the next NEW.
    pub next_free_id: ServiceId,
    pub transfers: Vec<DeferredTransfer>,
    pub yield_hash: Option<Hash>,
    pub provisions: BTreeSet<(ServiceId, Vec<u8>)>,
}

impl ResultContext {
    /// Gray Paper eq B.10: fresh context with the derived next free id.
    #[must_use]
    pub fn new(
        service_id: ServiceId,
        state: PartialState,
        timeslot: TimeSlot,
        entropy: &Hash,
    ) -> Self {
        let next_free_id = initial_service_id(service_id, entropy, timeslot, &state.accounts);
        Self {
            service_id,
            state,
            next_free_id,
            transfers: Vec::new(),
            yield_hash: None,
            provisions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn self_account(&self) -> Option<&ServiceAccount> {
        self.state.accounts.get(&self.service_id)
    }

    pub fn self_account_mut(&mut self) -> Option<&mut ServiceAccount> {
        self.state.accounts.get_mut(&self.service_id)
    }
}

/// 2^32 - Cminpublicindex - 2^8
const SERVICE_ID_MODULUS: u64 = (1u64 << 32) - MIN_PUBLIC_INDEX as u64 - (1 << 8);

/// i0 = check(S + decode4(H(E4(s) ‖ η ‖ E4(t))) mod (2^32 - S - 2^8))
#[must_use]
pub fn initial_service_id(
    service_id: ServiceId,
    entropy: &Hash,
    timeslot: TimeSlot,
    accounts: &BTreeMap<ServiceId, ServiceAccount>,
) -> ServiceId {
    let mut preimage = encode_fixed_length(u64::from(service_id), 4);
    preimage.extend_from_slice(entropy);
    preimage.extend_from_slice(&encode_fixed_length(u64::from(timeslot), 4));
    let hash = blake2b256(&preimage);
    let seed = decode_fixed_length(&hash, 4).map_or(0, |r| r.value);
    let candidate = u64::from(MIN_PUBLIC_INDEX) + seed % SERVICE_ID_MODULUS;
    check_service_id(candidate as ServiceId, accounts)
}

/// check(i): first id at or after `id` (cyclically over the public range) not in use.
#[must_use]
pub fn check_service_id(id: ServiceId, accounts: &BTreeMap<ServiceId, ServiceAccount>) -> ServiceId {
    let min_public = u64::from(MIN_PUBLIC_INDEX);
    let mut candidate = u64::from(id);
    while accounts.contains_key(&(candidate as ServiceId)) {
        candidate = min_public + (candidate.saturating_sub(min_public) + 1) % SERVICE_ID_MODULUS;
    }
    candidate as ServiceId
}

/// Successor of `id` after NEW consumed it: check(S + (i - S + 42) mod M).
#[must_use]
pub fn next_service_id(id: ServiceId, accounts: &BTreeMap<ServiceId, ServiceAccount>) -> ServiceId {
    let min_public = u64::from(MIN_PUBLIC_INDEX);
    let candidate =
        min_public + (u64::from(id).saturating_sub(min_public) + 42) % SERVICE_ID_MODULUS;
    check_service_id(candidate as ServiceId, accounts)
}
