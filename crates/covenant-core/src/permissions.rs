//! Scheme permission model
//!
//! A scheme holds a set of five capabilities. The set is a record of named
//! booleans with explicit set algebra rather than raw integer masks, but every
//! operation is bit-exact with the 5-bit encoding used on the wire
//! (`Registered` = bit 0 … `GenericCall` = bit 4).
//!
//! # Delegation rule
//!
//! A principal can only move the permission frontier inside the set of powers
//! it holds itself. For a registration that changes a target from `old` to
//! `new` on behalf of `actor`:
//!
//! - `(old ⊕ new) \ actor = ∅`: every toggled bit is held by the actor
//! - `old \ actor = ∅`: the target is not more powerful than the actor
//!
//! Removing a scheme requires `target \ actor = ∅`.

use crate::errors::CovenantError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask of the five meaningful bits
pub const VALID_BITS: u8 = 0b1_1111;

/// One of the five scheme capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// The scheme is registered; prerequisite for every other capability
    Registered,
    /// May register and unregister schemes
    RegisterSchemes,
    /// May add and remove global constraints
    ManageConstraints,
    /// May upgrade the controller
    Upgrade,
    /// May relay generic calls through the avatar
    GenericCall,
}

impl Permission {
    /// Every permission, in bit order
    pub const ALL: [Permission; 5] = [
        Permission::Registered,
        Permission::RegisterSchemes,
        Permission::ManageConstraints,
        Permission::Upgrade,
        Permission::GenericCall,
    ];

    /// Single-bit mask of this permission
    pub fn bit(self) -> u8 {
        match self {
            Permission::Registered => 0b0_0001,
            Permission::RegisterSchemes => 0b0_0010,
            Permission::ManageConstraints => 0b0_0100,
            Permission::Upgrade => 0b0_1000,
            Permission::GenericCall => 0b1_0000,
        }
    }

    /// Stable snake_case name
    pub fn name(self) -> &'static str {
        match self {
            Permission::Registered => "registered",
            Permission::RegisterSchemes => "register_schemes",
            Permission::ManageConstraints => "manage_constraints",
            Permission::Upgrade => "upgrade",
            Permission::GenericCall => "generic_call",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Permission set held by a scheme
///
/// The empty set means "absent": an unregistered principal and a deleted
/// entry are indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemePermissions {
    /// Bit 0
    pub registered: bool,
    /// Bit 1
    pub register_schemes: bool,
    /// Bit 2
    pub manage_constraints: bool,
    /// Bit 3
    pub upgrade: bool,
    /// Bit 4
    pub generic_call: bool,
}

impl SchemePermissions {
    /// The empty set
    pub const fn none() -> Self {
        Self {
            registered: false,
            register_schemes: false,
            manage_constraints: false,
            upgrade: false,
            generic_call: false,
        }
    }

    /// Every capability (held by the deployer at construction)
    pub const fn all() -> Self {
        Self {
            registered: true,
            register_schemes: true,
            manage_constraints: true,
            upgrade: true,
            generic_call: true,
        }
    }

    /// Decode from the 5-bit wire form; bits above bit 4 are ignored
    pub fn from_bits(bits: u8) -> Self {
        let mut set = Self::none();
        for permission in Permission::ALL {
            if bits & permission.bit() != 0 {
                set.set(permission, true);
            }
        }
        set
    }

    /// Encode to the 5-bit wire form
    pub fn bits(&self) -> u8 {
        Permission::ALL
            .iter()
            .filter(|p| self.contains(**p))
            .fold(0u8, |acc, p| acc | p.bit())
    }

    /// Build from an explicit list
    pub fn from_permissions(permissions: &[Permission]) -> Self {
        permissions
            .iter()
            .fold(Self::none(), |set, p| set.with(*p))
    }

    /// Whether `permission` is in the set
    pub fn contains(&self, permission: Permission) -> bool {
        match permission {
            Permission::Registered => self.registered,
            Permission::RegisterSchemes => self.register_schemes,
            Permission::ManageConstraints => self.manage_constraints,
            Permission::Upgrade => self.upgrade,
            Permission::GenericCall => self.generic_call,
        }
    }

    /// Whether `permission` is effective: present and the scheme registered
    pub fn grants(&self, permission: Permission) -> bool {
        self.registered && self.contains(permission)
    }

    /// Set or clear one permission
    pub fn set(&mut self, permission: Permission, value: bool) {
        match permission {
            Permission::Registered => self.registered = value,
            Permission::RegisterSchemes => self.register_schemes = value,
            Permission::ManageConstraints => self.manage_constraints = value,
            Permission::Upgrade => self.upgrade = value,
            Permission::GenericCall => self.generic_call = value,
        }
    }

    /// Copy with `permission` added
    pub fn with(mut self, permission: Permission) -> Self {
        self.set(permission, true);
        self
    }

    /// Copy with `permission` removed
    pub fn without(mut self, permission: Permission) -> Self {
        self.set(permission, false);
        self
    }

    fn zip(&self, other: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        let mut out = Self::none();
        for permission in Permission::ALL {
            out.set(
                permission,
                op(self.contains(permission), other.contains(permission)),
            );
        }
        out
    }

    /// `self ∪ other`
    pub fn union(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a || b)
    }

    /// `self ∩ other`
    pub fn intersection(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a && b)
    }

    /// `self \ other`: permissions in `self` not held by `other`
    pub fn difference(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a && !b)
    }

    /// `self ⊕ other`: permissions that differ between the two sets
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.zip(other, |a, b| a != b)
    }

    /// Whether every permission of `self` is in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.difference(other).is_empty()
    }

    /// Whether no permission is held
    pub fn is_empty(&self) -> bool {
        !Permission::ALL.iter().any(|p| self.contains(*p))
    }

    /// Iterate held permissions in bit order
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl fmt::Display for SchemePermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.bits())?;
        let names: Vec<&str> = self.iter().map(Permission::name).collect();
        write!(f, " [{}]", names.join(", "))
    }
}

impl From<u8> for SchemePermissions {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

/// Whether `flags` holds `permission`
pub fn has_bit(flags: SchemePermissions, permission: Permission) -> bool {
    flags.contains(permission)
}

/// Offending masks of a rejected permission change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDelta {
    /// Bits toggled between old and new that the actor does not hold
    pub toggled_without_authority: SchemePermissions,
    /// Bits of the current target that the actor does not hold
    pub exceeds_actor: SchemePermissions,
}

impl PermissionDelta {
    /// Whether the change is allowed
    pub fn is_allowed(&self) -> bool {
        self.toggled_without_authority.is_empty() && self.exceeds_actor.is_empty()
    }
}

impl fmt::Display for PermissionDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "toggled bits not held by caller {}, target bits not held by caller {}",
            self.toggled_without_authority, self.exceeds_actor
        )
    }
}

impl From<PermissionDelta> for CovenantError {
    fn from(delta: PermissionDelta) -> Self {
        CovenantError::privilege_escalation(delta.to_string())
    }
}

/// Check that `actor` may change a scheme from `old` to `new`
///
/// Both masks must be empty; the returned error carries them otherwise.
pub fn derive_permission_delta(
    old: SchemePermissions,
    new: SchemePermissions,
    actor: SchemePermissions,
) -> Result<(), PermissionDelta> {
    let delta = PermissionDelta {
        toggled_without_authority: old.symmetric_difference(&new).difference(&actor),
        exceeds_actor: old.difference(&actor),
    };
    if delta.is_allowed() {
        Ok(())
    } else {
        Err(delta)
    }
}

/// Check that `actor` may remove a scheme holding `target`
pub fn check_removal(
    target: SchemePermissions,
    actor: SchemePermissions,
) -> Result<(), PermissionDelta> {
    let exceeds_actor = target.difference(&actor);
    if exceeds_actor.is_empty() {
        Ok(())
    } else {
        Err(PermissionDelta {
            toggled_without_authority: SchemePermissions::none(),
            exceeds_actor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bits_round_trip_over_the_whole_domain() {
        for bits in 0u8..=VALID_BITS {
            assert_eq!(SchemePermissions::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn from_bits_masks_high_bits() {
        assert_eq!(SchemePermissions::from_bits(0xff), SchemePermissions::all());
        assert!(SchemePermissions::from_bits(0b1110_0000).is_empty());
    }

    #[test]
    fn grants_requires_registration() {
        let unregistered = SchemePermissions::none().with(Permission::Upgrade);
        assert!(unregistered.contains(Permission::Upgrade));
        assert!(!unregistered.grants(Permission::Upgrade));
        assert!(unregistered
            .with(Permission::Registered)
            .grants(Permission::Upgrade));
    }

    #[test]
    fn has_bit_matches_mask_for_every_flag_set() {
        for flags in 0u8..=VALID_BITS {
            let set = SchemePermissions::from_bits(flags);
            for permission in Permission::ALL {
                assert_eq!(
                    has_bit(set, permission),
                    flags & permission.bit() != 0,
                    "flags {flags:#07b}, {permission}"
                );
            }
        }
    }

    #[test]
    fn display_lists_names() {
        let set = SchemePermissions::from_bits(0b00011);
        assert_eq!(set.to_string(), "0b00011 [registered, register_schemes]");
    }

    #[test]
    fn registering_scheme_cannot_grant_upgrade() {
        let actor = SchemePermissions::from_bits(0b00011);
        let err = derive_permission_delta(
            SchemePermissions::none(),
            SchemePermissions::from_bits(0b01001),
            actor,
        )
        .unwrap_err();
        assert_eq!(
            err.toggled_without_authority,
            SchemePermissions::none().with(Permission::Upgrade)
        );
        assert!(err.exceeds_actor.is_empty());
    }

    #[test]
    fn cannot_touch_more_powerful_target() {
        let actor = SchemePermissions::from_bits(0b00011);
        let target = SchemePermissions::from_bits(0b00111);
        // Leaving the extra bit untouched is still rejected
        assert!(derive_permission_delta(target, target, actor).is_err());
        assert!(check_removal(target, actor).is_err());
        assert!(check_removal(actor, target).is_ok());
    }

    proptest! {
        #[test]
        fn delta_matches_bitwise_rule(old in 0u8..32, new in 0u8..32, actor in 0u8..32) {
            let expected = (old ^ new) & !actor & VALID_BITS == 0
                && old & !actor & VALID_BITS == 0;
            let result = derive_permission_delta(
                SchemePermissions::from_bits(old),
                SchemePermissions::from_bits(new),
                SchemePermissions::from_bits(actor),
            );
            prop_assert_eq!(result.is_ok(), expected);
        }

        #[test]
        fn removal_matches_bitwise_rule(target in 0u8..32, actor in 0u8..32) {
            let expected = target & !actor & VALID_BITS == 0;
            let result = check_removal(
                SchemePermissions::from_bits(target),
                SchemePermissions::from_bits(actor),
            );
            prop_assert_eq!(result.is_ok(), expected);
        }

        #[test]
        fn set_algebra_matches_bit_ops(a in 0u8..32, b in 0u8..32) {
            let sa = SchemePermissions::from_bits(a);
            let sb = SchemePermissions::from_bits(b);
            prop_assert_eq!(sa.union(&sb).bits(), a | b);
            prop_assert_eq!(sa.intersection(&sb).bits(), a & b);
            prop_assert_eq!(sa.difference(&sb).bits(), a & !b & VALID_BITS);
            prop_assert_eq!(sa.symmetric_difference(&sb).bits(), a ^ b);
            prop_assert_eq!(sa.is_subset_of(&sb), a & !b == 0);
        }
    }
}
