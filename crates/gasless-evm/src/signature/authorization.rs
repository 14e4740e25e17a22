use alloy::eips::eip7702::{Authorization, SignedAuthorization};
use tracing::instrument;

use crate::account::SmartAccount;
use crate::{Client, Error};

/// Sign the delegation of `account` to its implementation, valid for the transaction count `nonce`
pub fn sign_authorization(account: &SmartAccount, nonce: u64) -> Result<SignedAuthorization, Error> {
    let authorization = Authorization {
        chain_id: account.chain_id().as_u256(),
        address: account.delegate(),
        nonce,
    };

    let signature = account.sign_hash(&authorization.signature_hash())?;
    Ok(authorization.into_signed(signature))
}

/// Reads the transaction count of the owning key and signs the delegation against it right away.
/// Callers are expected to hold the key lock so that no other operation consumes the same count.
#[derive(Clone)]
pub struct AuthorizationSigner {
    client: Client,
}

impl AuthorizationSigner {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(name = "sign_authorization", skip(self, account), fields(owner = %account.address()))]
    pub async fn sign(&self, account: &SmartAccount) -> Result<SignedAuthorization, Error> {
        let nonce = self.client.fetch_transaction_count(account.address()).await?;

        sign_authorization(account, nonce)
    }
}
