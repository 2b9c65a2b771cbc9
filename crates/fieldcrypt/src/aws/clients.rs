//! AWS KMS client construction and its [`DataKeyClient`] implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::types::DataKeySpec;

use crate::dek::DataKeyClient;

/// Bundle of AWS SDK clients used by the service.
#[derive(Clone, Debug)]
pub struct AwsClients {
    /// KMS client used to generate data keys.
    pub kms: aws_sdk_kms::Client,
}

impl AwsClients {
    /// Initialise the AWS SDK clients.
    ///
    /// Credentials and region come from the standard AWS provider chain.
    /// `kms_endpoint` overrides the KMS endpoint URL, e.g. to target a local
    /// KMS emulator.
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK config cannot be loaded.
    pub async fn init(kms_endpoint: Option<&str>) -> Result<Self> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut kms_config = aws_sdk_kms::config::Builder::from(&config);
        if let Some(endpoint) = kms_endpoint {
            kms_config = kms_config.endpoint_url(endpoint);
        }
        let kms = aws_sdk_kms::Client::from_conf(kms_config.build());

        Ok(Self { kms })
    }
}

#[async_trait]
impl DataKeyClient for AwsClients {
    async fn generate_data_key(&self, key_id: &str) -> Result<Vec<u8>> {
        let resp = self
            .kms
            .generate_data_key()
            .key_id(key_id)
            .key_spec(DataKeySpec::Aes256)
            .send()
            .await
            .context("KMS GenerateDataKey request failed")?;

        let plaintext = resp
            .plaintext()
            .context("KMS GenerateDataKey response contained no plaintext")?;
        Ok(plaintext.as_ref().to_vec())
    }
}
