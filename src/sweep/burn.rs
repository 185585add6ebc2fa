//! Raw wire-format encoding of the SPL token burn operation.
//!
//! Encoded by hand rather than through the helper crates so the byte
//! layout is pinned in one place: a single tag byte followed by the raw
//! amount as a little-endian u64. Any deviation in tag value, byte order,
//! or account ordering/role flags produces a transaction the ledger
//! rejects or misinterprets.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Instruction tag of the burn operation in the SPL token wire format.
pub const BURN_TAG: u8 = 8;

/// Encode a burn of `raw_amount` base units from `token_account`.
///
/// The `token_program` is a parameter so Token-2022 holdings burn through
/// their own program. The `owner` must sign the enclosing transaction.
pub fn build_burn_instruction(
    token_program: &Pubkey,
    token_account: &Pubkey,
    mint: &Pubkey,
    owner: &Pubkey,
    raw_amount: u64,
) -> Instruction {
    let mut data = Vec::with_capacity(9);
    data.push(BURN_TAG);
    data.extend_from_slice(&raw_amount.to_le_bytes());

    Instruction {
        program_id: *token_program,
        accounts: vec![
            AccountMeta::new(*token_account, false),
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_layout_is_tag_plus_le_amount() {
        let ix = build_burn_instruction(
            &spl_token::id(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            1234,
        );

        assert_eq!(ix.data.len(), 9);
        assert_eq!(ix.data[0], BURN_TAG);
        let amount = u64::from_le_bytes(ix.data[1..9].try_into().unwrap());
        assert_eq!(amount, 1234);
    }

    #[test]
    fn account_roles() {
        let token_account = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let ix = build_burn_instruction(&spl_token::id(), &token_account, &mint, &owner, 1);

        assert_eq!(ix.accounts.len(), 3);
        assert_eq!(ix.accounts[0].pubkey, token_account);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[1].pubkey, mint);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[2].pubkey, owner);
        assert!(!ix.accounts[2].is_writable && ix.accounts[2].is_signer);
    }

    #[test]
    fn matches_spl_token_encoding() {
        let token_account = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();

        let ours =
            build_burn_instruction(&spl_token::id(), &token_account, &mint, &owner, 987_654_321);
        let reference = spl_token::instruction::burn(
            &spl_token::id(),
            &token_account,
            &mint,
            &owner,
            &[],
            987_654_321,
        )
        .unwrap();

        assert_eq!(ours.program_id, reference.program_id);
        assert_eq!(ours.data, reference.data);
        assert_eq!(ours.accounts, reference.accounts);
    }

    #[test]
    fn honors_token_2022_program() {
        let ix = build_burn_instruction(
            &spl_token_2022::id(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            7,
        );
        assert_eq!(ix.program_id, spl_token_2022::id());
    }
}
