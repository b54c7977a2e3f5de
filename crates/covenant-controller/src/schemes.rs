//! Scheme registry
//!
//! Maps each principal to its configuration hash and permission set. A
//! principal without an entry has the empty permission set.

use covenant_core::{has_bit, Address, Hash32, Permission, SchemePermissions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registration record of one scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    /// Opaque identifier of the scheme's configuration
    pub config_hash: Hash32,
    /// Capabilities held by the scheme
    pub permissions: SchemePermissions,
}

/// Principal → scheme binding
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: HashMap<Address, Scheme>,
}

impl SchemeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `principal`
    pub fn get(&self, principal: &Address) -> Option<&Scheme> {
        self.schemes.get(principal)
    }

    /// Permissions of `principal`; empty when absent
    pub fn permissions_of(&self, principal: &Address) -> SchemePermissions {
        self.schemes
            .get(principal)
            .map(|scheme| scheme.permissions)
            .unwrap_or_default()
    }

    /// Configuration hash of `principal`; `Hash32::ZERO` when absent
    pub fn config_hash_of(&self, principal: &Address) -> Hash32 {
        self.schemes
            .get(principal)
            .map(|scheme| scheme.config_hash)
            .unwrap_or_default()
    }

    /// Whether `principal` holds the Registered bit
    pub fn is_registered(&self, principal: &Address) -> bool {
        has_bit(self.permissions_of(principal), Permission::Registered)
    }

    /// Whether `principal` effectively holds `permission`
    pub fn grants(&self, principal: &Address, permission: Permission) -> bool {
        self.permissions_of(principal).grants(permission)
    }

    /// Create or overwrite the record of `principal`
    ///
    /// An empty permission set removes the record, keeping "empty" and
    /// "absent" the same state.
    pub fn register(
        &mut self,
        principal: Address,
        config_hash: Hash32,
        permissions: SchemePermissions,
    ) -> Option<Scheme> {
        if permissions.is_empty() {
            return self.schemes.remove(&principal);
        }
        self.schemes.insert(
            principal,
            Scheme {
                config_hash,
                permissions,
            },
        )
    }

    /// Delete the record of `principal`
    pub fn remove(&mut self, principal: &Address) -> Option<Scheme> {
        self.schemes.remove(principal)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// Returns `true` if no scheme is recorded
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// Iterate records in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Scheme)> {
        self.schemes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_principal_has_no_permissions() {
        let registry = SchemeRegistry::new();
        let who = Address::from_low_u64(1);
        assert!(registry.permissions_of(&who).is_empty());
        assert_eq!(registry.config_hash_of(&who), Hash32::ZERO);
        assert!(!registry.is_registered(&who));
    }

    #[test]
    fn register_overwrites_and_returns_previous() {
        let mut registry = SchemeRegistry::new();
        let who = Address::from_low_u64(1);
        let first = SchemePermissions::from_bits(0b00001);
        assert!(registry.register(who, Hash32::ZERO, first).is_none());

        let hash = Hash32::digest(b"cfg");
        let previous = registry
            .register(who, hash, SchemePermissions::from_bits(0b00011))
            .unwrap();
        assert_eq!(previous.permissions, first);
        assert_eq!(registry.config_hash_of(&who), hash);
        assert!(registry.grants(&who, Permission::RegisterSchemes));
    }

    #[test]
    fn registration_reads_the_registered_bit() {
        let mut registry = SchemeRegistry::new();
        let who = Address::from_low_u64(1);
        registry.register(who, Hash32::ZERO, SchemePermissions::from_bits(0b00100));
        assert!(!registry.is_registered(&who));
        assert!(!registry.grants(&who, Permission::ManageConstraints));
        registry.register(who, Hash32::ZERO, SchemePermissions::from_bits(0b00101));
        assert!(registry.is_registered(&who));
        assert!(registry.grants(&who, Permission::ManageConstraints));
    }

    #[test]
    fn empty_permissions_mean_absent() {
        let mut registry = SchemeRegistry::new();
        let who = Address::from_low_u64(1);
        registry.register(who, Hash32::ZERO, SchemePermissions::all());
        registry.register(who, Hash32::ZERO, SchemePermissions::none());
        assert!(registry.get(&who).is_none());
        assert!(registry.is_empty());
    }
}
