use crate::config::StorageConfig;
use crate::entities::producers;
use crate::services::database::DatabaseService;
use crate::services::storage::StorageService;
use crate::services::upload_service::{IncomingFile, UploadError};
use crate::utils::validation::{self, FileRules, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Which of the producer's brand images is being replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogoType {
    Logo,
    LogoWhite,
    LogoBlack,
    LogoBanner,
}

impl LogoType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogoType::Logo => "logo",
            LogoType::LogoWhite => "logo_white",
            LogoType::LogoBlack => "logo_black",
            LogoType::LogoBanner => "logo_banner",
        }
    }
}

impl FromStr for LogoType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "logo" => Ok(LogoType::Logo),
            "logo_white" => Ok(LogoType::LogoWhite),
            "logo_black" => Ok(LogoType::LogoBlack),
            "logo_banner" => Ok(LogoType::LogoBanner),
            other => Err(ValidationError {
                code: "INVALID_LOGO_TYPE",
                message: format!(
                    "Invalid logoType '{}'. Expected one of: logo, logo_white, logo_black, logo_banner",
                    other
                ),
            }),
        }
    }
}

pub struct ProducerService {
    db: Arc<dyn DatabaseService>,
    storage: Arc<dyn StorageService>,
    config: StorageConfig,
    rules: FileRules,
}

impl ProducerService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        storage: Arc<dyn StorageService>,
        config: StorageConfig,
        max_file_size: usize,
    ) -> Self {
        Self {
            db,
            storage,
            config,
            rules: FileRules::logo(max_file_size),
        }
    }

    pub async fn get_producer(&self, id: &str) -> Result<producers::Model, UploadError> {
        self.db
            .find_producer(id)
            .await?
            .ok_or_else(|| UploadError::ProducerNotFound(id.to_string()))
    }

    /// Stores a logo image and points the producer's `logo_type` column at
    /// its public URL. Logos are public brand assets, so no signed URL.
    pub async fn upload_logo(
        &self,
        producer_id: &str,
        logo_type: LogoType,
        file: IncomingFile,
    ) -> Result<String, UploadError> {
        validation::validate_upload(&file.file_name, &file.content_type, file.size(), &self.rules)?;
        self.get_producer(producer_id).await?;

        let extension = validation::file_extension(&file.file_name, &file.content_type);
        let key = format!(
            "{}/{}-{}.{}",
            producer_id,
            logo_type.as_str(),
            Uuid::new_v4(),
            extension
        );
        let bucket = &self.config.logo_bucket;

        self.storage
            .upload_file(
                bucket,
                &key,
                file.data,
                &validation::normalize_mime(&file.content_type),
            )
            .await?;

        let url = self.storage.public_url(bucket, &key);
        self.db
            .set_producer_logo(producer_id, logo_type, &url)
            .await?;

        tracing::info!(
            producer_id,
            logo_type = logo_type.as_str(),
            %url,
            "Updated producer logo"
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_type_parsing() {
        assert_eq!("logo".parse::<LogoType>().unwrap(), LogoType::Logo);
        assert_eq!("logo_banner".parse::<LogoType>().unwrap(), LogoType::LogoBanner);
        assert_eq!(LogoType::LogoWhite.as_str(), "logo_white");

        let err = "favicon".parse::<LogoType>().unwrap_err();
        assert_eq!(err.code, "INVALID_LOGO_TYPE");
    }
}
