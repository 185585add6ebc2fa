//! Token inventory scan across the supported token programs.
//!
//! A fresh scan runs on every sweep: holdings change as a direct result of
//! earlier steps in the same run, so nothing here is cached.

use std::str::FromStr;

use log::{debug, warn};
use solana_account_decoder::UiAccountData;
use solana_client::rpc_response::RpcKeyedAccount;
use solana_sdk::pubkey::Pubkey;

use crate::rpc::Ledger;
use crate::sweep::types::TokenHolding;

/// Every token program the treasury may hold accounts under.
pub fn supported_token_programs() -> [Pubkey; 2] {
    [spl_token::id(), spl_token_2022::id()]
}

/// Enumerate all non-zero token holdings of `owner`.
///
/// A per-program enumeration failure is non-fatal: it is logged and that
/// program's accounts are simply absent from the result.
pub async fn list_holdings(ledger: &dyn Ledger, owner: &Pubkey) -> Vec<TokenHolding> {
    let mut holdings = Vec::new();

    for program in supported_token_programs() {
        match ledger.token_accounts_by_program(owner, &program).await {
            Ok(accounts) => {
                for acc in &accounts {
                    match parse_keyed_account(acc) {
                        Some(holding) if holding.raw_amount > 0 => holdings.push(holding),
                        Some(_) => {} // empty account, nothing to sweep
                        None => debug!("[SCAN] skipping unparseable token account {}", acc.pubkey),
                    }
                }
            }
            Err(e) => warn!(
                "[SCAN] enumeration failed for token program {program}: {e:#}; continuing with remaining programs"
            ),
        }
    }

    holdings
}

/// Decode one jsonParsed token account into a [`TokenHolding`].
pub fn parse_keyed_account(acc: &RpcKeyedAccount) -> Option<TokenHolding> {
    let account = Pubkey::from_str(&acc.pubkey).ok()?;
    let token_program = Pubkey::from_str(&acc.account.owner).ok()?;

    let UiAccountData::Json(parsed) = &acc.account.data else {
        return None;
    };
    let info = parsed.parsed.get("info")?;
    let mint = Pubkey::from_str(info.get("mint")?.as_str()?).ok()?;
    let token_amount = info.get("tokenAmount")?;
    let raw_amount = token_amount.get("amount")?.as_str()?.parse().ok()?;
    let decimals = token_amount.get("decimals")?.as_u64()? as u8;

    Some(TokenHolding {
        account,
        mint,
        raw_amount,
        decimals,
        token_program,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyed_account(mint: &Pubkey, program: &Pubkey, amount: u64, decimals: u8) -> RpcKeyedAccount {
        serde_json::from_value(json!({
            "pubkey": Pubkey::new_unique().to_string(),
            "account": {
                "lamports": 2_039_280u64,
                "data": {
                    "program": "spl-token",
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": mint.to_string(),
                            "owner": Pubkey::new_unique().to_string(),
                            "state": "initialized",
                            "tokenAmount": {
                                "amount": amount.to_string(),
                                "decimals": decimals,
                                "uiAmountString": amount.to_string(),
                            }
                        }
                    },
                    "space": 165u64,
                },
                "owner": program.to_string(),
                "executable": false,
                "rentEpoch": 0u64,
                "space": 165u64,
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_json_parsed_account() {
        let mint = Pubkey::new_unique();
        let acc = keyed_account(&mint, &spl_token_2022::id(), 42, 6);

        let holding = parse_keyed_account(&acc).unwrap();
        assert_eq!(holding.mint, mint);
        assert_eq!(holding.raw_amount, 42);
        assert_eq!(holding.decimals, 6);
        assert_eq!(holding.token_program, spl_token_2022::id());
    }

    #[test]
    fn rejects_binary_encoded_account() {
        let acc: RpcKeyedAccount = serde_json::from_value(json!({
            "pubkey": Pubkey::new_unique().to_string(),
            "account": {
                "lamports": 1u64,
                "data": ["AAEC", "base64"],
                "owner": spl_token::id().to_string(),
                "executable": false,
                "rentEpoch": 0u64,
            }
        }))
        .unwrap();
        assert!(parse_keyed_account(&acc).is_none());
    }
}
