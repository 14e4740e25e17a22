use alloy::primitives::{Address, Bytes, U256};
use gasless_evm::constants::Token;
use gasless_evm::contract::{IERC20Permit, IFraminoBadge};
use gasless_evm::math::to_base_units;
use gasless_evm::operation::Call;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Badge ids of the collection. Ids 0 to 3 are the uncompleted seasons, 4 to 7 their completed
/// counterparts.
pub const MAX_BADGE_ID: u64 = 7;

/// Transfer `amount` (human readable, in stablecoin units) from the donor to the donation recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonateIntent {
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintIntent {
    pub recipient: Address,
    pub id: U256,
    pub value: U256,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkCompletedIntent {
    pub user: Address,
    pub id: U256,
    pub new_uri: String,
}

/// Burn `amount` badges `id` held by `holder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemIntent {
    pub holder: Address,
    pub id: U256,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Donate(DonateIntent),
    Mint(MintIntent),
    MarkCompleted(MarkCompletedIntent),
    Redeem(RedeemIntent),
}

/// Key on whose behalf an intent is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Donor,
    BadgeAdmin,
}

/// On-chain check run before anything is signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The smart account holds at least `amount` of `token`
    Balance { token: Address, amount: U256 },
}

/// Contracts an intent may target
#[derive(Debug, Clone, Copy)]
pub struct Targets {
    pub token: Address,
    pub badge: Option<Address>,
    pub donation_recipient: Option<Address>,
}

/// What a pipeline run executes for an intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPlan {
    pub owner: Owner,
    pub calls: Vec<Call>,
    pub precondition: Option<Precondition>,
}

fn non_zero(address: Address, field: &str) -> Result<Address, Error> {
    if address.is_zero() {
        return Err(Error::InvalidInput(format!("{} must not be the zero address", field)));
    }

    Ok(address)
}

fn positive(value: U256, field: &str) -> Result<U256, Error> {
    if value.is_zero() {
        return Err(Error::InvalidInput(format!("{} must be positive", field)));
    }

    Ok(value)
}

fn non_empty<'a>(value: &'a str, field: &str) -> Result<&'a str, Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }

    Ok(value)
}

impl Targets {
    fn badge(&self) -> Result<Address, Error> {
        self.badge.ok_or_else(|| Error::ConfigurationMissing("badge contract".to_string()))
    }

    fn donation_recipient(&self) -> Result<Address, Error> {
        self.donation_recipient
            .ok_or_else(|| Error::ConfigurationMissing("donation recipient".to_string()))
    }
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Donate(_) => "donate",
            Self::Mint(_) => "mint",
            Self::MarkCompleted(_) => "mark_completed",
            Self::Redeem(_) => "redeem",
        }
    }

    pub fn owner(&self) -> Owner {
        match self {
            Self::Donate(_) => Owner::Donor,
            Self::Mint(_) | Self::MarkCompleted(_) | Self::Redeem(_) => Owner::BadgeAdmin,
        }
    }

    /// Resolve the calls of the intent. Nothing here touches the network.
    pub fn plan(&self, targets: &Targets) -> Result<OperationPlan, Error> {
        let (calls, precondition) = match self {
            Self::Donate(intent) => {
                let amount = to_base_units(&intent.amount, Token::USDC_DECIMALS)?;
                let recipient = non_zero(targets.donation_recipient()?, "donation recipient")?;
                let transfer = IERC20Permit::transferCall { to: recipient, amount };

                (
                    vec![Call::new(targets.token, transfer)],
                    Some(Precondition::Balance { token: targets.token, amount }),
                )
            },
            Self::Mint(intent) => {
                let mint = IFraminoBadge::mintCall {
                    account: non_zero(intent.recipient, "recipient")?,
                    id: intent.id,
                    value: positive(intent.value, "value")?,
                    uri: non_empty(&intent.uri, "uri")?.to_string(),
                    data: Bytes::new(),
                };

                (vec![Call::new(targets.badge()?, mint)], None)
            },
            Self::MarkCompleted(intent) => {
                let mark = IFraminoBadge::markCompletedCall {
                    user: non_zero(intent.user, "user")?,
                    id: intent.id,
                    newUri: non_empty(&intent.new_uri, "new uri")?.to_string(),
                };

                (vec![Call::new(targets.badge()?, mark)], None)
            },
            Self::Redeem(intent) => {
                let redeem = IFraminoBadge::redeemCall {
                    user: non_zero(intent.holder, "holder")?,
                    id: intent.id,
                    amount: positive(intent.amount, "amount")?,
                };

                (vec![Call::new(targets.badge()?, redeem)], None)
            },
        };

        Ok(OperationPlan {
            owner: self.owner(),
            calls,
            precondition,
        })
    }
}
