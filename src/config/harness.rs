//! Validation harness configuration (fixture identities).

use serde::Deserialize;

/// Harness configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HarnessConfig {
    /// Customer synthesized when the datastore has none.
    #[serde(default)]
    pub customer: CustomerFixtureConfig,
}

/// Identity of the synthesized customer fixture.
///
/// `email` is the idempotence key: a second run reuses the row carrying it.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerFixtureConfig {
    #[serde(default = "default_customer_name")]
    pub name: String,
    #[serde(default = "default_customer_email")]
    pub email: String,
    #[serde(default = "default_customer_phone")]
    pub phone: String,
}

impl Default for CustomerFixtureConfig {
    fn default() -> Self {
        Self {
            name: default_customer_name(),
            email: default_customer_email(),
            phone: default_customer_phone(),
        }
    }
}

fn default_customer_name() -> String {
    "Test Customer".to_string()
}

fn default_customer_email() -> String {
    "customer@test.com".to_string()
}

fn default_customer_phone() -> String {
    "1234567890".to_string()
}
