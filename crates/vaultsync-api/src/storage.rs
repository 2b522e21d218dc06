use std::time::Duration;

use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use serde::Serialize;
use vaultsync_core::transfer::{PlannedTransfer, TransferMethod};

use crate::config::{AppConfig, R2RuntimeConfig};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct PresignedOperation {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// A planned transfer together with the URL the device uses to perform it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransfer {
    #[serde(flatten)]
    pub transfer: PlannedTransfer,
    pub operation: PresignedOperation,
}

/// Issues presigned R2 URLs for file transfers.
#[derive(Clone)]
pub struct R2PresignService {
    bucket: String,
    ttl: Duration,
    client: Client,
}

impl R2PresignService {
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        config
            .r2
            .clone()
            .map(|r2| Self::new(r2, config.transfer_url_ttl))
    }

    pub fn new(config: R2RuntimeConfig, ttl: Duration) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "vaultsync-api-r2",
        );

        let endpoint = format!("https://{}.r2.cloudflarestorage.com", config.account_id);
        let shared_config = aws_sdk_s3::Config::builder()
            .region(Region::new("auto"))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(shared_config);

        Self {
            bucket: config.bucket,
            ttl,
            client,
        }
    }

    /// Sign every planned transfer, failing the whole batch on the first
    /// error so no partial set of URLs reaches the device.
    pub async fn presign_transfers(
        &self,
        transfers: Vec<PlannedTransfer>,
    ) -> Result<Vec<SignedTransfer>, AppError> {
        let mut signed = Vec::with_capacity(transfers.len());
        for transfer in transfers {
            let operation = match transfer.method {
                TransferMethod::Get => self.presign_download(&transfer.object_key).await?,
                TransferMethod::Put => self.presign_upload(&transfer.object_key).await?,
            };
            signed.push(SignedTransfer {
                transfer,
                operation,
            });
        }
        Ok(signed)
    }

    pub async fn presign_upload(&self, object_key: &str) -> Result<PresignedOperation, AppError> {
        let object_key = normalize_object_key(object_key)?;
        let operation = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("application/octet-stream")
            .presigned(presign_config(self.ttl)?)
            .await
            .map_err(|error| {
                AppError::service_unavailable(format!(
                    "Failed to presign upload URL: {}",
                    sanitize(&error)
                ))
            })?;
        Ok(map_presigned(
            operation.method().to_string(),
            operation.uri().to_string(),
            operation.headers(),
        ))
    }

    pub async fn presign_download(&self, object_key: &str) -> Result<PresignedOperation, AppError> {
        let object_key = normalize_object_key(object_key)?;
        let operation = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .presigned(presign_config(self.ttl)?)
            .await
            .map_err(|error| {
                AppError::service_unavailable(format!(
                    "Failed to presign download URL: {}",
                    sanitize(&error)
                ))
            })?;
        Ok(map_presigned(
            operation.method().to_string(),
            operation.uri().to_string(),
            operation.headers(),
        ))
    }
}

fn map_presigned<'a>(
    method: String,
    url: String,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
) -> PresignedOperation {
    let headers = headers
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    PresignedOperation {
        method,
        url,
        headers,
    }
}

fn normalize_object_key(raw: &str) -> Result<String, AppError> {
    let key = raw.trim().trim_start_matches('/').to_string();
    if key.is_empty() {
        return Err(AppError::bad_request("object key is required"));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(AppError::bad_request(
            "object key must not contain path traversal segments",
        ));
    }
    Ok(key)
}

fn presign_config(ttl: Duration) -> Result<PresigningConfig, AppError> {
    PresigningConfig::expires_in(ttl)
        .map_err(|error| AppError::internal(format!("Invalid presign TTL: {}", sanitize(&error))))
}

fn sanitize(error: &impl std::fmt::Display) -> String {
    error.to_string().replace('\n', " ").trim().to_string()
}
