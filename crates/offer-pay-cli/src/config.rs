use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use offer_pay::bitcoin::secp256k1::SecretKey;
use offer_pay::lightning::offers::offer::Offer;
use offer_pay::{Amount, ContactInfo};
use offer_pay_fake::{FakePeer, StaticKeyProvider};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WORK_DIR: &str = ".offer-pay";
pub const ENV_PREFIX: &str = "OFFER_PAY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Privacy {
    /// Reveal the stable payer key when paying offers of known contacts
    #[serde(default)]
    pub reveal_stable_key_to_contacts: bool,
    /// Hex encoded stable payer key
    pub stable_key: Option<String>,
}

impl Privacy {
    pub fn key_provider(&self) -> anyhow::Result<StaticKeyProvider> {
        match &self.stable_key {
            Some(key) => Ok(StaticKeyProvider::new(SecretKey::from_str(key)?)),
            None => {
                tracing::info!("No stable key configured, using a random one");
                Ok(StaticKeyProvider::random())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub offers: Vec<String>,
}

impl Contact {
    /// Offers that fail to parse are skipped
    pub fn to_contact_info(&self) -> ContactInfo {
        let offers = self
            .offers
            .iter()
            .filter_map(|offer| match Offer::from_str(offer) {
                Ok(offer) => Some(offer),
                Err(_) => {
                    tracing::warn!("Skipping invalid offer for contact {}", self.name);
                    None
                }
            })
            .collect();

        ContactInfo::new(self.name.clone(), offers)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakePeerSettings {
    pub payment_delay_secs: u64,
    pub fee_percent: f32,
    pub min_fee_msat: u64,
}

impl Default for FakePeerSettings {
    fn default() -> Self {
        Self {
            payment_delay_secs: 1,
            fee_percent: 0.01,
            min_fee_msat: 1000,
        }
    }
}

impl FakePeerSettings {
    pub fn peer(&self) -> FakePeer {
        FakePeer::new(
            Duration::from_secs(self.payment_delay_secs),
            self.fee_percent,
            Amount::from(self.min_fee_msat),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub payment: offer_pay::Settings,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub fake_peer: FakePeerSettings,
}

impl Settings {
    #[must_use]
    pub fn new<P>(config_file_name: Option<P>) -> Self
    where
        P: Into<PathBuf>,
    {
        let default_settings = Self::default();
        // attempt to construct settings with file
        let from_file = Self::new_from_default(&default_settings, config_file_name);
        match from_file {
            Ok(f) => f,
            Err(e) => {
                tracing::error!("Error reading config file, falling back to defaults. Error: {e}");
                default_settings
            }
        }
    }

    fn new_from_default<P>(
        default: &Settings,
        config_file_name: Option<P>,
    ) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let (config, required) = match config_file_name {
            Some(value) => (value.into(), true),
            None => {
                let mut default_config_file_name = home::home_dir()
                    .ok_or(ConfigError::NotFound("Config Path".to_string()))?
                    .join(DEFAULT_WORK_DIR);
                default_config_file_name.push("config.toml");
                (default_config_file_name, false)
            }
        };

        let config: Config = Config::builder()
            // use defaults
            .add_source(Config::try_from(default)?)
            // override with file contents
            .add_source(File::from(config).required(required))
            // override with environment
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use offer_pay_fake::{create_fake_offer, FakeOfferDescription};

    use super::*;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "offer-pay-cli-{}-{}.toml",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config(
            "overrides",
            r#"
[payment]
max_payer_note_len = 64

[privacy]
reveal_stable_key_to_contacts = true

[[contacts]]
name = "alice"
offers = []

[fake_peer]
payment_delay_secs = 0
fee_percent = 0.02
min_fee_msat = 10
"#,
        );

        let settings = Settings::new(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.payment.max_payer_note_len, 64);
        assert_eq!(settings.payment.fetch_invoice_timeout_secs, 30);
        assert!(settings.privacy.reveal_stable_key_to_contacts);
        assert_eq!(settings.contacts.len(), 1);
        assert_eq!(settings.contacts[0].name, "alice");
        assert_eq!(settings.fake_peer.min_fee_msat, 10);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::new(Some("/nonexistent/offer-pay/config.toml"));

        assert_eq!(settings.payment, offer_pay::Settings::default());
        assert!(!settings.privacy.reveal_stable_key_to_contacts);
        assert!(settings.contacts.is_empty());
    }

    #[test]
    fn test_contact_skips_invalid_offers() {
        let offer = create_fake_offer(None, &FakeOfferDescription::default()).unwrap();
        let contact = Contact {
            name: "bob".to_string(),
            offers: vec![offer.to_string(), "not an offer".to_string()],
        };

        let info = contact.to_contact_info();

        assert_eq!(info.offers.len(), 1);
        assert!(info.has_offer(&offer));
    }

    #[test]
    fn test_configured_stable_key() {
        let privacy = Privacy {
            reveal_stable_key_to_contacts: true,
            stable_key: Some(
                "0101010101010101010101010101010101010101010101010101010101010101".to_string(),
            ),
        };
        let provider = privacy.key_provider().unwrap();
        let expected = StaticKeyProvider::new(SecretKey::from_slice(&[1u8; 32]).unwrap());

        assert_eq!(provider.public_key(), expected.public_key());

        let invalid = Privacy {
            reveal_stable_key_to_contacts: false,
            stable_key: Some("zz".to_string()),
        };
        assert!(invalid.key_provider().is_err());
    }
}
