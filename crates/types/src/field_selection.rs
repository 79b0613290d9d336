//! User field projections and the upstream field masks derived from them.

use serde::{Deserialize, Serialize};

/// Per-entity field selection supplied by the user via `setFields`.
///
/// Every field defaults to the entity's default projection (see the
/// `Default` impls below); `Some(false)` disables a field that would
/// otherwise be on by default, `Some(true)` enables one that wouldn't.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub block: BlockFields,
    pub transaction: TransactionFields,
    pub log: LogFields,
}

/// Sparse user input to `setFields`: each sub-selection is entirely
/// optional, and within it every field is itself `Some`/`None` (see
/// `BlockFieldsInput` and friends below).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectionInput {
    pub block: BlockFieldsInput,
    pub transaction: TransactionFieldsInput,
    pub log: LogFieldsInput,
}

impl FieldSelection {
    /// Resolves a user's sparse `setFields` input into a concrete mask:
    /// start from the per-entity defaults, apply the user's overrides, then
    /// force on the fields that must always be present regardless of what
    /// the user asked for (`# 4.1`).
    pub fn resolve(input: FieldSelectionInput) -> Self {
        let mut selection = Self::default();
        selection.block.apply_overrides(input.block);
        selection.transaction.apply_overrides(input.transaction);
        selection.log.apply_overrides(input.log);
        selection.block.force_always_on();
        selection.transaction.force_always_on();
        selection.log.force_always_on();
        selection
    }
}

macro_rules! field_mask {
    ($name:ident, $overrides:ident { $($field:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: bool),+
        }

        /// Sparse user overrides for [`$name`]: `None` leaves the default
        /// projection's value untouched, `Some(_)` sets it explicitly.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $overrides {
            $(pub $field: Option<bool>),+
        }

        impl $name {
            /// Applies sparse overrides on top of this (default) mask.
            fn apply_overrides(&mut self, overrides: $overrides) {
                $(if let Some(value) = overrides.$field { self.$field = value; })+
            }
        }
    };
}

field_mask!(BlockFields, BlockFieldsInput {
    number,
    hash,
    parent_hash,
    timestamp,
    nonce,
    difficulty,
    total_difficulty,
    size,
    gas_used,
    gas_limit,
    base_fee_per_gas,
});

field_mask!(TransactionFields, TransactionFieldsInput {
    index,
    hash,
    from,
    to,
    input,
    value,
    gas,
    gas_price,
    nonce,
    v,
    r,
    s,
    chain_id,
    y_parity,
    max_fee_per_gas,
    max_priority_fee_per_gas,
});

field_mask!(LogFields, LogFieldsInput {
    index,
    address,
    topics,
    data,
    transaction_index,
    transaction_hash,
    // Whether the owning transaction is projected alongside the log
    // (drives whether the per-log upstream sub-query carries a transaction
    // projection, per `# 4.1`).
    transaction,
});

/// Default field projection: `block.{number, hash, parentHash, timestamp}`.
impl Default for BlockFields {
    fn default() -> Self {
        Self {
            number: true,
            hash: true,
            parent_hash: true,
            timestamp: true,
            nonce: false,
            difficulty: false,
            total_difficulty: false,
            size: false,
            gas_used: false,
            gas_limit: false,
            base_fee_per_gas: false,
        }
    }
}

/// Default field projection: `transaction.{hash, from, to, input}`.
impl Default for TransactionFields {
    fn default() -> Self {
        Self {
            index: false,
            hash: true,
            from: true,
            to: true,
            input: true,
            value: false,
            gas: false,
            gas_price: false,
            nonce: false,
            v: false,
            r: false,
            s: false,
            chain_id: false,
            y_parity: false,
            max_fee_per_gas: false,
            max_priority_fee_per_gas: false,
        }
    }
}

/// Default field projection: `log.{address, topics, data, transactionHash}`.
impl Default for LogFields {
    fn default() -> Self {
        Self {
            index: false,
            address: true,
            topics: true,
            data: true,
            transaction_index: false,
            transaction_hash: true,
            transaction: false,
        }
    }
}

impl BlockFields {
    /// Forces on the fields that must always be present: `block.{hash, number}`.
    pub fn force_always_on(&mut self) {
        self.hash = true;
        self.number = true;
    }
}

impl TransactionFields {
    /// Forces on the fields that must always be present: `transaction.index`.
    pub fn force_always_on(&mut self) {
        self.index = true;
    }
}

impl LogFields {
    /// Forces on the fields that must always be present:
    /// `log.{index, transactionIndex}`.
    pub fn force_always_on(&mut self) {
        self.index = true;
        self.transaction_index = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_no_input_yields_defaults_plus_always_on() {
        let selection = FieldSelection::resolve(FieldSelectionInput::default());
        assert!(selection.block.number && selection.block.hash);
        assert!(selection.transaction.index); // always-on, off by default otherwise
        assert!(selection.log.index && selection.log.transaction_index);
    }

    #[test]
    fn override_disables_a_default_on_field() {
        let input = FieldSelectionInput {
            block: BlockFieldsInput { timestamp: Some(false), ..Default::default() },
            ..Default::default()
        };
        let selection = FieldSelection::resolve(input);
        assert!(!selection.block.timestamp);
        assert!(selection.block.hash); // untouched default stays on
    }

    #[test]
    fn override_cannot_turn_off_an_always_on_field() {
        let input = FieldSelectionInput {
            log: LogFieldsInput { index: Some(false), ..Default::default() },
            ..Default::default()
        };
        let selection = FieldSelection::resolve(input);
        assert!(selection.log.index, "always-on fields win over user overrides");
    }

    #[test]
    fn override_enables_a_default_off_field() {
        let input = FieldSelectionInput {
            transaction: TransactionFieldsInput { value: Some(true), ..Default::default() },
            ..Default::default()
        };
        let selection = FieldSelection::resolve(input);
        assert!(selection.transaction.value);
    }
}
