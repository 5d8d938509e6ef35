use log::{debug, info, warn};

use super::{LargeStore, SmallStore, StoreError};
use crate::session::Session;

pub const SESSION_KEY: &str = "swiftread.session";
/// Small-tier key recording which tier holds the session.
pub const TIER_FLAG_KEY: &str = "swiftread.session.tier";
/// Payloads above this size go straight to the large tier.
pub const SMALL_TIER_MAX_BYTES: usize = 2 * 1024 * 1024;

const LARGE_FLAG_VALUE: &str = "large";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageTier {
    Small,
    Large,
}

/// Session persistence over a small and a large key-value tier.
///
/// Saves go to the small tier first and are promoted to the large tier when
/// the small one is full or unavailable. Writes take `&mut self`, so two
/// saves can never interleave on the session key.
pub struct SessionStore<S, L>
where
    S: SmallStore,
    L: LargeStore,
{
    small: S,
    large: L,
    tier: Option<StorageTier>,
}

impl<S, L> SessionStore<S, L>
where
    S: SmallStore,
    L: LargeStore,
{
    pub fn new(small: S, large: L) -> Self {
        Self {
            small,
            large,
            tier: None,
        }
    }

    pub fn small(&self) -> &S {
        &self.small
    }

    pub fn large(&self) -> &L {
        &self.large
    }

    pub fn into_parts(self) -> (S, L) {
        (self.small, self.large)
    }

    /// Tier the stored session lives in, from the cached flag or the small
    /// store.
    pub fn tier(&mut self) -> StorageTier {
        if let Some(tier) = self.tier {
            return tier;
        }

        let tier = match self.small.get(TIER_FLAG_KEY) {
            Ok(Some(flag)) if flag == LARGE_FLAG_VALUE => StorageTier::Large,
            Ok(_) => StorageTier::Small,
            Err(err) => {
                debug!("session: tier flag unreadable ({err}), assuming large tier");
                StorageTier::Large
            }
        };
        self.tier = Some(tier);
        tier
    }

    /// Replace the stored session. Returns `false` when neither tier took it.
    pub async fn save(&mut self, session: &Session) -> bool {
        let payload = match session.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                warn!("session: encode failed: {err}");
                return false;
            }
        };

        if payload.len() <= SMALL_TIER_MAX_BYTES {
            match self.small.put(SESSION_KEY, &payload) {
                Ok(()) => {
                    self.settle_on_small().await;
                    debug!("session: saved bytes={} tier=small", payload.len());
                    return true;
                }
                Err(StoreError::QuotaExceeded) => {
                    info!(
                        "session: small tier full, promoting bytes={}",
                        payload.len()
                    );
                }
                Err(err) => {
                    warn!("session: small tier write failed ({err}), trying large tier");
                }
            }
        } else {
            debug!(
                "session: payload bytes={} over small-tier limit",
                payload.len()
            );
        }

        match self.large.put(SESSION_KEY, &payload).await {
            Ok(()) => {
                self.settle_on_large();
                debug!("session: saved bytes={} tier=large", payload.len());
                true
            }
            Err(err) => {
                warn!("session: save failed on both tiers: {err}");
                false
            }
        }
    }

    async fn settle_on_small(&mut self) {
        if self.tier() == StorageTier::Large {
            if let Err(err) = self.large.delete(SESSION_KEY).await {
                debug!("session: stale large copy not removed: {err}");
            }
            if let Err(err) = self.small.delete(TIER_FLAG_KEY) {
                debug!("session: tier flag not cleared: {err}");
            }
        }
        self.tier = Some(StorageTier::Small);
    }

    fn settle_on_large(&mut self) {
        // free the small tier before writing the flag into it
        if let Err(err) = self.small.delete(SESSION_KEY) {
            debug!("session: stale small copy not removed: {err}");
        }
        if let Err(err) = self.small.put(TIER_FLAG_KEY, LARGE_FLAG_VALUE) {
            warn!("session: tier flag not persisted: {err}");
        }
        self.tier = Some(StorageTier::Large);
    }

    /// Stored session, or `None` when nothing usable is stored.
    pub async fn load(&mut self) -> Option<Session> {
        let payload = match self.tier() {
            StorageTier::Large => match self.read_large().await {
                Some(payload) => Some(payload),
                None => self.read_small(),
            },
            StorageTier::Small => match self.read_small() {
                Some(payload) => Some(payload),
                None => self.read_large().await,
            },
        }?;

        match Session::from_json(&payload) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("session: stored payload unreadable: {err}");
                None
            }
        }
    }

    fn read_small(&self) -> Option<String> {
        self.small.get(SESSION_KEY).unwrap_or_else(|err| {
            debug!("session: small tier read failed: {err}");
            None
        })
    }

    async fn read_large(&self) -> Option<String> {
        self.large.get(SESSION_KEY).await.unwrap_or_else(|err| {
            debug!("session: large tier read failed: {err}");
            None
        })
    }

    pub async fn has(&mut self) -> bool {
        match self.tier() {
            StorageTier::Large => {
                self.large.has(SESSION_KEY).await.unwrap_or(false)
                    || self.small.has(SESSION_KEY).unwrap_or(false)
            }
            StorageTier::Small => {
                self.small.has(SESSION_KEY).unwrap_or(false)
                    || self.large.has(SESSION_KEY).await.unwrap_or(false)
            }
        }
    }

    /// Delete the session from both tiers. Returns `false` if any tier
    /// could not be cleared.
    pub async fn clear(&mut self) -> bool {
        let small = self.small.delete(SESSION_KEY);
        let flag = self.small.delete(TIER_FLAG_KEY);
        let large = self.large.delete(SESSION_KEY).await;
        self.tier = Some(StorageTier::Small);

        let mut cleared = true;
        for result in [small, flag, large] {
            if let Err(err) = result {
                warn!("session: clear incomplete: {err}");
                cleared = false;
            }
        }
        cleared
    }
}
