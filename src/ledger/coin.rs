use serde::{Deserialize, Serialize};

/// A transfer directive: move `amount` from one name to another.
///
/// Names need not be known when the coin is built; whether the transfer is
/// acceptable is decided by the chain that records it. Amounts are signed and
/// carry no sufficient-funds rule, so balances may go negative.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    from: String,
    to: String,
    memo: String,
    amount: i64,
}

impl Coin {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        memo: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            memo: memo.into(),
            amount,
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Canonical bytes fed into the chain hash
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            12 + self.from.len() + self.to.len() + self.memo.len() + 8,
        );

        for field in [&self.from, &self.to, &self.memo] {
            bytes.extend_from_slice(&(field.len() as u32).to_le_bytes());
            bytes.extend_from_slice(field.as_bytes());
        }
        bytes.extend_from_slice(&self.amount.to_le_bytes());

        bytes
    }
}
