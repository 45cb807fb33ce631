//! Token ownership check via `balanceOf`.

use crate::address::Address;
use crate::chain::abi::{self, ViewCall, BALANCE_OF, BALANCE_OF_ID};
use crate::chain::ViewCaller;
use crate::error::Result;
use num_bigint::BigUint;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Which `balanceOf` flavour a query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStandard {
    /// `balanceOf(address)`.
    Erc721,
    /// `balanceOf(address,uint256)`.
    Erc1155,
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erc721 => f.write_str("ERC-721"),
            Self::Erc1155 => f.write_str("ERC-1155"),
        }
    }
}

/// What to ask the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipQuery {
    /// NFT contract.
    pub contract: Address,
    /// Wallet whose balance is checked.
    pub owner: Address,
    /// Token id; present selects ERC-1155 semantics.
    pub token_id: Option<BigUint>,
}

impl OwnershipQuery {
    /// The standard implied by the presence of a token id.
    #[must_use]
    pub fn standard(&self) -> TokenStandard {
        if self.token_id.is_some() {
            TokenStandard::Erc1155
        } else {
            TokenStandard::Erc721
        }
    }

    /// The `balanceOf` call for this query.
    ///
    /// # Errors
    ///
    /// Returns an error if the token id does not fit in a uint256.
    pub fn view_call(&self) -> Result<ViewCall> {
        let call = match &self.token_id {
            None => ViewCall::new(BALANCE_OF).arg(self.owner.to_word()),
            Some(id) => ViewCall::new(BALANCE_OF_ID)
                .arg(self.owner.to_word())
                .arg(abi::uint_word(id)?),
        };
        Ok(call)
    }
}

/// What the chain answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipResult {
    /// Token balance of the owner.
    pub balance: BigUint,
}

impl OwnershipResult {
    /// Any positive balance grants access, whatever its magnitude.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        self.balance.bits() > 0
    }
}

/// Runs ownership queries through a [`ViewCaller`].
#[derive(Clone)]
pub struct OwnershipChecker {
    caller: Arc<dyn ViewCaller>,
}

impl OwnershipChecker {
    /// Create a checker over the given caller.
    #[must_use]
    pub fn new(caller: Arc<dyn ViewCaller>) -> Self {
        Self { caller }
    }

    /// Query the owner's balance.
    ///
    /// # Errors
    ///
    /// Returns upstream errors from the caller unchanged, so a failing RPC
    /// is never mistaken for a zero balance.
    pub async fn check(&self, query: &OwnershipQuery) -> Result<OwnershipResult> {
        let call = query.view_call()?;
        debug!(
            "Checking {} balance of {} on {}",
            query.standard(),
            query.owner,
            query.contract
        );

        let balance = self.caller.call_uint(&query.contract, &call).await?;
        let result = OwnershipResult { balance };

        info!(
            "Balance of {} is {} ({})",
            query.owner,
            result.balance,
            if result.grants_access() {
                "granted"
            } else {
                "denied"
            }
        );
        Ok(result)
    }
}
