//! Property test strategies for Covenant types

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use covenant_core::{Address, CallPhase, Hash32, SchemePermissions};

/// Any of the 32 permission sets
pub fn arb_permissions() -> impl Strategy<Value = SchemePermissions> {
    (0u8..=0b11111).prop_map(SchemePermissions::from_bits)
}

/// Non-zero address from a small seed range, so collisions are likely
pub fn arb_address() -> impl Strategy<Value = Address> {
    (1u64..64).prop_map(Address::from_low_u64)
}

pub fn arb_hash() -> impl Strategy<Value = Hash32> {
    any::<[u8; 32]>().prop_map(Hash32::from_bytes)
}

pub fn arb_call_phase() -> impl Strategy<Value = CallPhase> {
    prop_oneof![
        Just(CallPhase::Pre),
        Just(CallPhase::Post),
        Just(CallPhase::PreAndPost),
    ]
}
