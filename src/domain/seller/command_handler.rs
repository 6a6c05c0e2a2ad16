use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::access::{Actor, Role};
use crate::errors::{ErrorKind, ServiceError};
use crate::lifecycle::{execute, Aggregate, Committed, EventEnvelope};
use crate::media::{MediaStore, MediaUpload};
use crate::messaging::EventBus;
use crate::metrics::Metrics;
use crate::store::{RecordStore, StoreError};
use crate::utils::RetryConfig;

use super::aggregate::SellerProfile;
use super::commands::{ProfileDetails, SellerCommand};
use super::errors::CertificationError;
use super::value_objects::CertificationKind;

// ============================================================================
// Seller Command Handler
// ============================================================================

/// Something a save skipped without failing
#[derive(Debug, Clone, Serialize)]
pub struct SaveWarning {
    pub kind: ErrorKind,
    pub message: String,
}

/// A save that went through, with anything that was skipped along the way
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome<T> {
    pub record: T,
    pub warnings: Vec<SaveWarning>,
}

pub struct SellerCommandHandler {
    profiles: Arc<dyn RecordStore<SellerProfile>>,
    media: Arc<dyn MediaStore>,
    bus: EventBus,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
}

impl SellerCommandHandler {
    pub fn new(
        profiles: Arc<dyn RecordStore<SellerProfile>>,
        media: Arc<dyn MediaStore>,
        bus: EventBus,
        metrics: Arc<Metrics>,
        retry: RetryConfig,
    ) -> Self {
        Self { profiles, media, bus, metrics, retry }
    }

    /// Create or update a profile; a failed logo upload only adds a warning
    pub async fn save_profile(
        &self,
        actor: Actor,
        seller_id: Uuid,
        details: ProfileDetails,
        logo: Option<MediaUpload>,
    ) -> Result<SaveOutcome<SellerProfile>, ServiceError> {
        if !(actor.is_admin() || actor.is(Role::Seller, seller_id)) {
            return Err(CertificationError::Forbidden("sellers only edit their own profile".to_string()).into());
        }
        // Nothing reaches media storage for a save that would be rejected
        details.business_name()?;

        let mut warnings = Vec::new();
        let logo_url = match logo {
            Some(upload) => match self.media.store("logos", &upload).await {
                Ok(url) => Some(url),
                Err(e) => {
                    self.metrics.record_upload_failure();
                    tracing::warn!(
                        seller_id = %seller_id,
                        file_name = %upload.file_name,
                        error = %e,
                        "Logo upload failed, saving profile without it"
                    );
                    warnings.push(SaveWarning {
                        kind: ErrorKind::UploadFailed,
                        message: format!("Logo was not uploaded ({}); the profile was saved without it", e),
                    });
                    None
                }
            },
            None => None,
        };

        let record = match self.profiles.get(seller_id).await? {
            Some(_) => self.update_profile(actor, seller_id, details, logo_url).await?,
            None => {
                let event = SellerProfile::create(seller_id, actor, &details, logo_url.clone(), Utc::now())?;
                let profile = SellerProfile::apply_first_event(&event)?;
                match self.profiles.insert(&profile).await {
                    Ok(()) => {
                        tracing::info!(seller_id = %seller_id, business_name = %profile.business_name, "🏪 Seller profile created");
                        self.bus.publish_all(EventEnvelope::wrap_all(seller_id, 0, vec![event], Some(actor)));
                        profile
                    }
                    // Someone created it first; apply ours as an update
                    Err(StoreError::AlreadyExists { .. }) => {
                        self.update_profile(actor, seller_id, details, logo_url).await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        Ok(SaveOutcome { record, warnings })
    }

    async fn update_profile(
        &self,
        actor: Actor,
        seller_id: Uuid,
        details: ProfileDetails,
        logo_url: Option<String>,
    ) -> Result<SellerProfile, ServiceError> {
        let profile = self
            .handle(seller_id, actor, SellerCommand::SaveProfile { actor, details, logo_url })
            .await?;
        tracing::info!(seller_id = %seller_id, "Seller profile updated");
        Ok(profile)
    }

    /// Seller claims (`certified = true`) or withdraws a certification
    pub async fn set_certification(
        &self,
        actor: Actor,
        seller_id: Uuid,
        kind: CertificationKind,
        certified: bool,
    ) -> Result<SellerProfile, ServiceError> {
        let profile = self
            .handle(seller_id, actor, SellerCommand::SetCertification { actor, kind, certified })
            .await?;
        tracing::info!(
            seller_id = %seller_id,
            certification = %kind,
            certified = certified,
            pending_approval = profile.certifications.get(kind).pending_approval,
            "Certification flag set"
        );
        Ok(profile)
    }

    pub async fn approve_certification(
        &self,
        actor: Actor,
        seller_id: Uuid,
        kind: CertificationKind,
    ) -> Result<SellerProfile, ServiceError> {
        let profile = self
            .handle(seller_id, actor, SellerCommand::ApproveCertification { actor, kind })
            .await?;
        tracing::info!(seller_id = %seller_id, certification = %kind, "✅ Certification approved");
        Ok(profile)
    }

    async fn handle(
        &self,
        seller_id: Uuid,
        actor: Actor,
        command: SellerCommand,
    ) -> Result<SellerProfile, ServiceError> {
        let Committed { record, events } = execute(
            self.profiles.as_ref(),
            &self.metrics,
            self.retry.clone(),
            seller_id,
            actor,
            &command,
        )
        .await?;

        self.bus.publish_all(events);
        Ok(record)
    }

    pub async fn get_profile(&self, seller_id: Uuid) -> Result<SellerProfile, ServiceError> {
        self.profiles
            .get(seller_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("seller profile", seller_id))
    }

    /// Profiles with at least one claim awaiting an admin
    pub async fn pending_certifications(&self, actor: Actor) -> Result<Vec<SellerProfile>, ServiceError> {
        if !actor.is_admin() {
            return Err(ServiceError::Forbidden("certification review is for admins".to_string()));
        }
        let mut profiles: Vec<SellerProfile> = self
            .profiles
            .list()
            .await?
            .into_iter()
            .filter(|p| !p.certifications.pending().is_empty())
            .collect();
        profiles.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenMedia;

    #[async_trait]
    impl MediaStore for BrokenMedia {
        async fn store(&self, _folder: &str, _upload: &MediaUpload) -> Result<String, MediaError> {
            Err(MediaError::Io(std::io::Error::other("bucket unreachable")))
        }
    }

    struct FixedMedia;

    #[async_trait]
    impl MediaStore for FixedMedia {
        async fn store(&self, folder: &str, upload: &MediaUpload) -> Result<String, MediaError> {
            Ok(format!("/media/{}/{}", folder, upload.file_name))
        }
    }

    fn handler(media: Arc<dyn MediaStore>) -> (SellerCommandHandler, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = SellerCommandHandler::new(
            Arc::new(MemoryStore::<SellerProfile>::new()),
            media,
            EventBus::default(),
            metrics.clone(),
            RetryConfig::for_conflicts(5),
        );
        (handler, metrics)
    }

    fn details(name: &str) -> ProfileDetails {
        ProfileDetails {
            business_name: name.to_string(),
            location: Some("Bagamoyo".to_string()),
            description: None,
        }
    }

    fn logo() -> Option<MediaUpload> {
        Some(MediaUpload { file_name: "logo.png".to_string(), bytes: vec![1, 2, 3] })
    }

    #[tokio::test]
    async fn test_failed_logo_upload_degrades_to_warning() {
        let (handler, metrics) = handler(Arc::new(BrokenMedia));
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let outcome = handler
            .save_profile(seller, seller.id, details("Bagamoyo Prawns"), logo())
            .await
            .unwrap();

        assert_eq!(outcome.record.business_name, "Bagamoyo Prawns");
        assert_eq!(outcome.record.logo_url, None);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, ErrorKind::UploadFailed);
        assert_eq!(metrics.upload_failures.get(), 1);
    }

    #[derive(Default)]
    struct CountingMedia {
        stored: AtomicUsize,
    }

    #[async_trait]
    impl MediaStore for CountingMedia {
        async fn store(&self, folder: &str, upload: &MediaUpload) -> Result<String, MediaError> {
            self.stored.fetch_add(1, Ordering::SeqCst);
            Ok(format!("/media/{}/{}", folder, upload.file_name))
        }
    }

    #[tokio::test]
    async fn test_invalid_profile_stores_no_logo() {
        let media = Arc::new(CountingMedia::default());
        let (handler, _) = handler(media.clone());
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let err = handler
            .save_profile(seller, seller.id, details("   "), logo())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(media.stored.load(Ordering::SeqCst), 0);

        handler.save_profile(seller, seller.id, details("Kilwa Catch"), logo()).await.unwrap();
        assert_eq!(media.stored.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_save_updates_and_keeps_logo() {
        let (handler, _) = handler(Arc::new(FixedMedia));
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let first = handler
            .save_profile(seller, seller.id, details("Bagamoyo Prawns"), logo())
            .await
            .unwrap();
        assert_eq!(first.record.logo_url.as_deref(), Some("/media/logos/logo.png"));
        assert!(first.warnings.is_empty());

        let second = handler
            .save_profile(seller, seller.id, details("Bagamoyo Prawns & Crab"), None)
            .await
            .unwrap();
        assert_eq!(second.record.business_name, "Bagamoyo Prawns & Crab");
        assert_eq!(second.record.logo_url.as_deref(), Some("/media/logos/logo.png"));
        assert_eq!(second.record.version, 2);
    }

    #[tokio::test]
    async fn test_haccp_claim_then_admin_approval() {
        let (handler, _) = handler(Arc::new(FixedMedia));
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        handler.save_profile(seller, seller.id, details("Kilwa Catch"), None).await.unwrap();

        let claimed = handler
            .set_certification(seller, seller.id, CertificationKind::Haccp, true)
            .await
            .unwrap();
        assert!(claimed.certifications.haccp.pending_approval);
        assert_eq!(handler.pending_certifications(admin).await.unwrap().len(), 1);

        let approved = handler
            .approve_certification(admin, seller.id, CertificationKind::Haccp)
            .await
            .unwrap();
        assert!(approved.certifications.haccp.approved);
        assert!(!approved.certifications.haccp.pending_approval);
        assert!(handler.pending_certifications(admin).await.unwrap().is_empty());

        let withdrawn = handler
            .set_certification(seller, seller.id, CertificationKind::Haccp, false)
            .await
            .unwrap();
        assert_eq!(withdrawn.certifications.haccp, Default::default());
    }

    #[tokio::test]
    async fn test_certification_requires_profile_and_owner() {
        let (handler, _) = handler(Arc::new(FixedMedia));
        let seller = Actor::new(Uuid::new_v4(), Role::Seller);

        let err = handler
            .set_certification(seller, seller.id, CertificationKind::Gmp, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        handler.save_profile(seller, seller.id, details("Kilwa Catch"), None).await.unwrap();
        let other = Actor::new(Uuid::new_v4(), Role::Seller);
        let err = handler
            .set_certification(other, seller.id, CertificationKind::Gmp, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = handler
            .save_profile(other, seller.id, details("Hijack"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
