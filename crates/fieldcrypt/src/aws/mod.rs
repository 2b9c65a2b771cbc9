//! AWS SDK client initialisation for KMS.
//!
//! Only constructed in production mode, where data keys come from KMS
//! `GenerateDataKey`.

pub mod clients;

pub use clients::AwsClients;
