//! Runtime configuration loader and common helpers.

use std::{fmt, fs, path::Path, str::FromStr, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use solana_sdk::{
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

/// Environment variable that overrides the `wallet_private_key` settings key,
/// so the signing key can stay out of the settings file entirely.
pub const PRIVATE_KEY_ENV: &str = "SWEEPER_PRIVATE_KEY";

/// ------------------------------------------------------------------
/// Main Settings object – *single definition only!*
/// ------------------------------------------------------------------
///
/// Constructed once at process start and passed by reference into the
/// orchestrator; nothing reads configuration ambiently mid-run.
#[derive(Clone)]
pub struct Settings {
    /* -------- infrastructure ------------------------ */
    pub rpc_url: String,
    pub aggregator_url: String,
    pub bind_addr: String,

    /* -------- treasury wallet ----------------------- */
    pub wallet_address: Pubkey,
    pub keypair: Arc<Keypair>,

    /* -------- sweep tuning -------------------------- */
    pub target_mint: Pubkey,
    pub sol_threshold_lamports: u64,
    pub fee_reserve_lamports: u64,
    /// Safety fraction converted to basis points at load time so every
    /// downstream computation stays in integer math.
    pub safety_bps: u64,
    pub slippage_bps: u16,

    /* -------- network bounds ------------------------ */
    pub rpc_timeout_secs: u64,
    pub confirm_timeout_secs: u64,

    /* -------- trigger auth -------------------------- */
    pub auth_secret: String,
}

impl Settings {
    /// --------------------------------------------------------------
    /// Read `settings.json` from disk.
    /// --------------------------------------------------------------
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        let json: Value = serde_json::from_str(&raw).context("parsing settings file")?;

        /* -------- plain strings ---------------------------------- */
        let rpc_url = required_str(&json, "rpc_url")?;
        let aggregator_url = json["aggregator_url"]
            .as_str()
            .unwrap_or("https://quote-api.jup.ag/v6")
            .trim_end_matches('/')
            .to_string();
        let bind_addr = json["bind_addr"]
            .as_str()
            .unwrap_or("0.0.0.0:8080")
            .to_string();
        let auth_secret = required_str(&json, "auth_secret")?;

        /* -------- wallet ----------------------------------------- */
        let wallet_address = Pubkey::from_str(&required_str(&json, "wallet_address")?)
            .context("invalid `wallet_address`")?;
        let target_mint = Pubkey::from_str(&required_str(&json, "target_mint")?)
            .context("invalid `target_mint`")?;

        let private_key_base58 = std::env::var(PRIVATE_KEY_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| json["wallet_private_key"].as_str().map(str::to_string))
            .ok_or_else(|| {
                anyhow!("missing `wallet_private_key` (settings key or {PRIVATE_KEY_ENV} env)")
            })?;
        let private_key_bytes = bs58::decode(private_key_base58.trim())
            .into_vec()
            .context("decoding base58 private key")?;
        let keypair = Arc::new(Keypair::from_bytes(&private_key_bytes)?);

        /* -------- numeric parameters ----------------------------- */
        let sol_threshold_lamports = sol_to_lamports(json["sol_threshold_sol"].as_f64().unwrap_or(0.05));
        let fee_reserve_lamports = sol_to_lamports(json["fee_reserve_sol"].as_f64().unwrap_or(0.01));

        let safety_fraction = json["safety_fraction"].as_f64().unwrap_or(0.85);
        if !(safety_fraction > 0.0 && safety_fraction <= 1.0) {
            bail!("`safety_fraction` must be in (0, 1], got {safety_fraction}");
        }
        let safety_bps = (safety_fraction * 10_000.0).round() as u64;
        if safety_bps == 0 {
            bail!("`safety_fraction` {safety_fraction} rounds to zero basis points");
        }

        let slippage_bps = json["slippage_bps"].as_u64().unwrap_or(50);
        if slippage_bps > u16::MAX as u64 {
            bail!("`slippage_bps` {slippage_bps} out of range");
        }

        let rpc_timeout_secs = json["rpc_timeout_secs"].as_u64().unwrap_or(30);
        let confirm_timeout_secs = json["confirm_timeout_secs"].as_u64().unwrap_or(45);

        Ok(Self {
            rpc_url,
            aggregator_url,
            bind_addr,
            wallet_address,
            keypair,
            target_mint,
            sol_threshold_lamports,
            fee_reserve_lamports,
            safety_bps,
            slippage_bps: slippage_bps as u16,
            rpc_timeout_secs,
            confirm_timeout_secs,
            auth_secret,
        })
    }

    /// --------------------------------------------------------------
    /// Load settings from default config/settings.json file.
    /// --------------------------------------------------------------
    pub fn load() -> Result<Self> {
        Self::load_from_file("config/settings.json")
    }

    /// --------------------------------------------------------------
    /// The signing key must derive the configured treasury address.
    /// A mismatch invalidates the whole process before any network
    /// call with financial consequence is made.
    /// --------------------------------------------------------------
    pub fn validate(&self) -> Result<()> {
        let derived = self.keypair.pubkey();
        if derived != self.wallet_address {
            bail!(
                "signing key mismatch: key derives {derived}, settings declare {}",
                self.wallet_address
            );
        }
        Ok(())
    }
}

/// Helper: convert SOL → lamports and round to nearest integer.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

fn required_str(json: &Value, key: &str) -> Result<String> {
    json[key]
        .as_str()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing required settings key `{key}`"))
}

/* ------------------------------------------------------------------ */
/*  Manual Debug implementation (never print key material)            */
/* ------------------------------------------------------------------ */
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("rpc_url", &self.rpc_url)
            .field("aggregator_url", &self.aggregator_url)
            .field("wallet_address", &self.wallet_address)
            .field("target_mint", &self.target_mint)
            .field("sol_threshold_lamports", &self.sol_threshold_lamports)
            .field("fee_reserve_lamports", &self.fee_reserve_lamports)
            .field("safety_bps", &self.safety_bps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_settings(json: serde_json::Value) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("sweeper-settings-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
        path
    }

    fn sample_json(keypair: &Keypair) -> serde_json::Value {
        serde_json::json!({
            "rpc_url": "http://127.0.0.1:8899",
            "wallet_address": keypair.pubkey().to_string(),
            "wallet_private_key": bs58::encode(keypair.to_bytes()).into_string(),
            "target_mint": Pubkey::new_unique().to_string(),
            "auth_secret": "sekrit",
            "sol_threshold_sol": 0.02,
            "fee_reserve_sol": 0.01,
            "safety_fraction": 0.85,
        })
    }

    #[test]
    fn loads_and_converts_units() {
        let keypair = Keypair::new();
        let path = write_settings(sample_json(&keypair));
        let settings = Settings::load_from_file(&path).unwrap();

        assert_eq!(settings.sol_threshold_lamports, 20_000_000);
        assert_eq!(settings.fee_reserve_lamports, 10_000_000);
        assert_eq!(settings.safety_bps, 8_500);
        assert_eq!(settings.slippage_bps, 50); // default
        assert_eq!(settings.wallet_address, keypair.pubkey());
        settings.validate().unwrap();

        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let keypair = Keypair::new();
        let mut json = sample_json(&keypair);
        json.as_object_mut().unwrap().remove("auth_secret");
        let path = write_settings(json);

        let err = Settings::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("auth_secret"));

        fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_out_of_range_safety_fraction() {
        let keypair = Keypair::new();
        let mut json = sample_json(&keypair);
        json["safety_fraction"] = serde_json::json!(1.5);
        let path = write_settings(json);

        assert!(Settings::load_from_file(&path).is_err());

        fs::remove_file(path).ok();
    }

    #[test]
    fn key_mismatch_fails_validation() {
        let keypair = Keypair::new();
        let mut json = sample_json(&keypair);
        json["wallet_address"] = serde_json::json!(Pubkey::new_unique().to_string());
        let path = write_settings(json);

        let settings = Settings::load_from_file(&path).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("mismatch"));

        fs::remove_file(path).ok();
    }
}
