//! License lifecycle manager.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use licensehub_core::config::LicenseConfig;
use licensehub_core::error::AppError;
use licensehub_core::traits::Clock;
use licensehub_core::types::{PageRequest, PageResponse};
use licensehub_database::store::{LicenseStats, LicenseStore, PutOutcome};
use licensehub_entity::license::{
    ActivationResult, License, LicenseKind, LicenseStatus, MAX_ALLOTTED_SECONDS, MAX_VALIDITY_DAYS,
};

use crate::email::{mask_email, normalize_email};

use super::error::LicenseError;
use super::key::{generate_key, mask_key, synthetic_order_id};
use super::token::{LicenseClaims, LicenseTokenSigner};

/// Fresh keys tried when a generated key collides with an existing one.
const KEY_ATTEMPTS: u32 = 3;
/// Order id prefix for admin grants.
const ADMIN_ORDER_PREFIX: &str = "ADMIN";
/// Order id prefix for trials.
const TRIAL_ORDER_PREFIX: &str = "TRIAL";

/// What happened to a usage report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UsageOutcome {
    /// Usage was added to the license.
    Applied {
        /// Status after the report.
        status: LicenseStatus,
        /// Seconds left after the report.
        remaining_seconds: i64,
    },
    /// The license does not consume reported usage (wall-clock kind,
    /// expired or revoked), or the report was empty.
    NotApplicable {
        /// Current status.
        status: LicenseStatus,
        /// Seconds left.
        remaining_seconds: i64,
    },
    /// No license has this key.
    UnknownKey,
    /// Every compare-and-swap attempt lost; the report was dropped.
    Dropped,
}

impl UsageOutcome {
    /// Whether the report changed the stored license.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of a read-modify-write attempt.
enum Mutation {
    Updated(License),
    Unchanged(License),
}

/// Owns every state change a license goes through.
///
/// All mutations are per-key read-modify-write loops over
/// [`LicenseStore::compare_and_swap`]; there is no global lock.
#[derive(Debug, Clone)]
pub struct LicenseManager {
    /// License store backend.
    store: Arc<dyn LicenseStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Lifecycle settings.
    config: LicenseConfig,
    /// Token signer; `None` issues opaque keys only.
    tokens: Option<LicenseTokenSigner>,
}

impl LicenseManager {
    /// Creates a new license manager.
    pub fn new(store: Arc<dyn LicenseStore>, clock: Arc<dyn Clock>, config: LicenseConfig) -> Self {
        Self {
            store,
            clock,
            config,
            tokens: None,
        }
    }

    /// Attach a token signer so activations and grants carry a signed
    /// license token.
    pub fn with_tokens(mut self, tokens: Option<LicenseTokenSigner>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Whether signed tokens are issued.
    pub fn issues_tokens(&self) -> bool {
        self.tokens.is_some()
    }

    /// Signed token for `license`, if a signer is configured.
    pub fn token_for(&self, license: &License) -> Result<Option<String>, LicenseError> {
        self.tokens
            .as_ref()
            .map(|signer| signer.sign(license))
            .transpose()
    }

    /// Verify a license token and report the license's current state.
    ///
    /// The signature and `exp` are checked first; the key must still exist.
    pub async fn verify_token(
        &self,
        token: &str,
    ) -> Result<(LicenseClaims, ActivationResult), LicenseError> {
        let signer = self.tokens.as_ref().ok_or(LicenseError::InvalidToken)?;
        let claims = signer.verify(token, self.clock.now())?;
        let license = self.require(&claims.key).await?;
        Ok((claims, ActivationResult::observe(&license, self.clock.now())))
    }

    /// Current time according to the manager's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a usage-metered license for a paid order.
    pub async fn issue(
        &self,
        email: &str,
        duration: Duration,
        order_id: &str,
    ) -> Result<License, LicenseError> {
        let seconds = allotment_seconds(duration)?;
        let email = normalize_email(email).map_err(LicenseError::InvalidEmail)?;
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(LicenseError::InvalidOrderId);
        }

        self.insert_with_fresh_key(LicenseKind::Purchase, &email, order_id, seconds)
            .await
    }

    /// Issue a wall-clock license on behalf of an administrator.
    pub async fn grant(&self, email: &str, duration: Duration) -> Result<License, LicenseError> {
        let seconds = allotment_seconds(duration)?;
        let email = normalize_email(email).map_err(LicenseError::InvalidEmail)?;
        self.insert_synthetic(LicenseKind::AdminGrant, ADMIN_ORDER_PREFIX, &email, seconds)
            .await
    }

    /// Start a wall-clock trial with the configured window.
    pub async fn start_trial(&self, email: &str) -> Result<License, LicenseError> {
        let seconds = Duration::try_seconds(self.config.trial_seconds)
            .ok_or(LicenseError::InvalidDuration)
            .and_then(allotment_seconds)?;
        let email = normalize_email(email).map_err(LicenseError::InvalidEmail)?;
        self.insert_synthetic(LicenseKind::Trial, TRIAL_ORDER_PREFIX, &email, seconds)
            .await
    }

    /// Look up a key and report its status and remaining time.
    ///
    /// Nothing is written; activating the same key repeatedly is
    /// idempotent. An elapsed wall-clock window is reported as expired even
    /// if the sweeper has not persisted it yet.
    pub async fn activate(&self, key: &str) -> Result<ActivationResult, LicenseError> {
        let license = self.require(key).await?;
        let mut result = ActivationResult::observe(&license, self.clock.now());
        if result.status.is_active() {
            result.token = self.token_for(&license)?;
        }

        info!(
            key = %mask_key(key),
            status = %result.status,
            remaining_seconds = result.remaining_seconds,
            "License activated"
        );
        Ok(result)
    }

    /// Add reported usage to a usage-metered license.
    ///
    /// Reports larger than `max_usage_report_seconds` are clamped. Unknown
    /// keys, wall-clock licenses and inactive licenses are ignored. Usage
    /// that would exceed the allotment clamps to it and expires the license.
    pub async fn record_usage(
        &self,
        key: &str,
        elapsed: Duration,
    ) -> Result<UsageOutcome, LicenseError> {
        let mut seconds = elapsed.num_seconds();
        if seconds < 0 {
            return Err(LicenseError::InvalidDuration);
        }
        if seconds > self.config.max_usage_report_seconds {
            warn!(
                key = %mask_key(key),
                reported = seconds,
                accepted = self.config.max_usage_report_seconds,
                "Usage report exceeds the per-report maximum; clamping"
            );
            seconds = self.config.max_usage_report_seconds;
        }

        let mutation = self
            .mutate(key, |license, now| license.apply_usage(seconds, now))
            .await;

        match mutation {
            Ok(Mutation::Updated(license)) => {
                let now = self.clock.now();
                if license.status == LicenseStatus::Expired {
                    info!(key = %mask_key(key), "License usage allotment exhausted");
                } else {
                    debug!(key = %mask_key(key), seconds, "Usage recorded");
                }
                Ok(UsageOutcome::Applied {
                    status: license.status,
                    remaining_seconds: license.remaining_seconds(now),
                })
            }
            Ok(Mutation::Unchanged(license)) => {
                let now = self.clock.now();
                Ok(UsageOutcome::NotApplicable {
                    status: license.effective_status(now),
                    remaining_seconds: license.remaining_seconds(now),
                })
            }
            Err(LicenseError::UnknownKey) => {
                warn!(key = %mask_key(key), "Usage reported for unknown license key");
                Ok(UsageOutcome::UnknownKey)
            }
            Err(LicenseError::Contention { attempts }) => {
                warn!(key = %mask_key(key), attempts, seconds, "Usage report dropped");
                Ok(UsageOutcome::Dropped)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the license has expired.
    ///
    /// Wall-clock licenses compare elapsed time since issue with their
    /// window; usage-metered licenses report whether their status is
    /// `expired`.
    pub async fn check_expiry(&self, key: &str) -> Result<bool, LicenseError> {
        let license = self.require(key).await?;
        Ok(license.is_expired_at(self.clock.now()))
    }

    /// Revoke a license. Revoking an already revoked license succeeds.
    pub async fn revoke(&self, key: &str) -> Result<License, LicenseError> {
        let license = match self
            .mutate(key, |license, now| {
                license.transition(LicenseStatus::Revoked, now)
            })
            .await?
        {
            Mutation::Updated(license) => {
                info!(key = %mask_key(key), "License revoked");
                license
            }
            Mutation::Unchanged(license) => {
                debug!(key = %mask_key(key), "License already revoked");
                license
            }
        };
        Ok(license)
    }

    /// Fetch a license.
    pub async fn get(&self, key: &str) -> Result<License, LicenseError> {
        self.require(key).await
    }

    /// Fetch the license issued for an order, if any.
    pub async fn find_by_order(&self, order_id: &str) -> Result<Option<License>, LicenseError> {
        Ok(self.store.find_by_order(order_id).await?)
    }

    /// One page of licenses, newest first.
    pub async fn list(&self, page: PageRequest) -> Result<PageResponse<License>, LicenseError> {
        let page = page.normalized();
        let (items, total) = self.store.list(page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Counts by status.
    pub async fn stats(&self) -> Result<LicenseStats, LicenseError> {
        Ok(self.store.stats().await?)
    }

    /// Persist `expired` for every active license past its calendar end:
    /// elapsed wall-clock windows and licenses older than the validity cap.
    /// Returns how many licenses changed.
    pub async fn expire_elapsed(&self) -> Result<u64, LicenseError> {
        let now = self.clock.now();
        let issued_before = now
            .checked_sub_signed(Duration::days(MAX_VALIDITY_DAYS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let candidates = self.store.list_expiry_candidates(issued_before).await?;
        let mut expired = 0u64;

        for license in candidates.iter().filter(|l| l.has_lapsed(now)) {
            let result = self
                .mutate(&license.key, |current, now| {
                    current.has_lapsed(now) && current.transition(LicenseStatus::Expired, now)
                })
                .await;

            match result {
                Ok(Mutation::Updated(_)) => {
                    expired += 1;
                    debug!(key = %mask_key(&license.key), kind = %license.kind, "License reached its calendar end");
                }
                Ok(Mutation::Unchanged(_)) => {}
                Err(LicenseError::Contention { attempts }) => {
                    warn!(key = %mask_key(&license.key), attempts, "Skipped expiring license");
                }
                Err(LicenseError::UnknownKey) => {}
                Err(e) => return Err(e),
            }
        }

        if expired > 0 {
            info!(expired, "Expired licenses past their calendar end");
        }
        Ok(expired)
    }

    /// Store health.
    pub async fn health_check(&self) -> Result<bool, LicenseError> {
        Ok(self.store.health_check().await?)
    }

    /// Store backend name.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    async fn require(&self, key: &str) -> Result<License, LicenseError> {
        self.store
            .get(key.trim())
            .await?
            .ok_or(LicenseError::UnknownKey)
    }

    /// Read-modify-write loop. `apply` returns whether it changed anything.
    async fn mutate<F>(&self, key: &str, mut apply: F) -> Result<Mutation, LicenseError>
    where
        F: FnMut(&mut License, DateTime<Utc>) -> bool + Send,
    {
        let attempts = self.config.cas_retries.max(1);
        for attempt in 1..=attempts {
            let current = self.require(key).await?;
            let now = self.clock.now();
            let mut next = current.clone();

            if !apply(&mut next, now) {
                return Ok(Mutation::Unchanged(current));
            }

            if self.store.compare_and_swap(current.version, &next).await? {
                next.version = current.version + 1;
                return Ok(Mutation::Updated(next));
            }
            debug!(key = %mask_key(key), attempt, "Lost compare-and-swap, retrying");
        }
        Err(LicenseError::Contention { attempts })
    }

    async fn insert_synthetic(
        &self,
        kind: LicenseKind,
        order_prefix: &str,
        email: &str,
        seconds: i64,
    ) -> Result<License, LicenseError> {
        let mut last_err = None;
        for _ in 0..KEY_ATTEMPTS {
            let order_id = synthetic_order_id(order_prefix, self.clock.now());
            match self
                .insert_with_fresh_key(kind, email, &order_id, seconds)
                .await
            {
                Err(err @ LicenseError::DuplicateOrder { .. }) => last_err = Some(err),
                other => return other,
            }
        }
        Err(last_err.unwrap_or_else(|| {
            LicenseError::Store(AppError::internal("Could not allocate an order id"))
        }))
    }

    async fn insert_with_fresh_key(
        &self,
        kind: LicenseKind,
        email: &str,
        order_id: &str,
        seconds: i64,
    ) -> Result<License, LicenseError> {
        for _ in 0..KEY_ATTEMPTS {
            let license = License::new(
                generate_key(&self.config.key_prefix),
                email.to_string(),
                order_id.to_string(),
                kind,
                seconds,
                self.clock.now(),
            );

            match self.store.put(&license).await? {
                PutOutcome::Inserted => {
                    info!(
                        key = %mask_key(&license.key),
                        email = %mask_email(email),
                        order_id,
                        kind = %kind,
                        allotted_seconds = seconds,
                        "License issued"
                    );
                    return Ok(license);
                }
                PutOutcome::DuplicateOrder => {
                    warn!(order_id, "Order already has a license");
                    return Err(LicenseError::DuplicateOrder {
                        order_id: order_id.to_string(),
                    });
                }
                PutOutcome::DuplicateKey => {
                    warn!("Generated license key collided; regenerating");
                }
            }
        }
        Err(LicenseError::Store(AppError::internal(
            "Could not generate a unique license key",
        )))
    }
}

/// Whole seconds of an allotment: positive and within the validity cap.
fn allotment_seconds(duration: Duration) -> Result<i64, LicenseError> {
    match duration.num_seconds() {
        s if s > 0 && s <= MAX_ALLOTTED_SECONDS => Ok(s),
        _ => Err(LicenseError::InvalidDuration),
    }
}
