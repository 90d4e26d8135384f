//! crates/dashboard_core/src/slices/facts.rs
//!
//! Rotating "fact" widget. Fact ids are fetched in pages into a pool; each
//! shown fact is removed from the pool so it is not repeated before the next
//! refill.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::domain::{Fact, FactId};
use crate::messages::{FACTS_INIT_ERROR, FACT_ERROR};
use crate::slices::FetchOutcome;
use crate::store::Store;

pub const FACT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactsState {
    pub fact: Option<Fact>,
    pub pool: Vec<FactId>,
    /// Offset of the next page to fetch.
    pub offset: usize,
    pub timestamp: Option<DateTime<Utc>>,
    pub is_error: bool,
    pub is_fetching: bool,
    pub is_initialized: bool,
}

pub struct FactsSlice<'a> {
    store: &'a Store,
}

impl<'a> FactsSlice<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Returns the current offset if the fetch may start, marking it in flight.
    fn begin(&self) -> Option<usize> {
        self.store.update(|s| {
            let facts = &mut s.facts;
            if facts.is_fetching {
                return None;
            }
            facts.is_fetching = true;
            facts.is_error = false;
            Some(facts.offset)
        })
    }

    fn fail(&self, action: &str, message: &str) -> FetchOutcome {
        error!("{}: {}", action, message);
        self.store.update(|s| {
            s.facts.is_fetching = false;
            s.facts.is_error = true;
        });
        FetchOutcome::Failed
    }

    /// Replaces the pool with the page at the current offset and advances it.
    pub async fn fetch_fact_ids(&self) -> FetchOutcome {
        let Some(offset) = self.begin() else {
            debug!("fetch_fact_ids already in flight");
            return FetchOutcome::Skipped;
        };

        let services = self.store.services();
        match services.facts.fact_id_page(offset, FACT_PAGE_SIZE).await {
            Ok(ids) => {
                let now = services.clock.now();
                let exhausted = ids.is_empty() && offset > 0;
                if exhausted {
                    info!("Fact list exhausted at offset {}, wrapping around", offset);
                }
                self.store.update(|s| {
                    let facts = &mut s.facts;
                    facts.pool = ids;
                    facts.offset = if exhausted { 0 } else { offset + FACT_PAGE_SIZE };
                    facts.timestamp = Some(now);
                    facts.is_fetching = false;
                    facts.is_initialized = true;
                });
                FetchOutcome::Fetched
            }
            Err(e) => self.fail("fetch_fact_ids", e.message().unwrap_or(FACTS_INIT_ERROR)),
        }
    }

    /// Fetches one fact and removes its id from the pool.
    pub async fn fetch_fact(&self, id: &FactId) -> FetchOutcome {
        if id.is_empty() {
            return FetchOutcome::Failed;
        }

        let started = self.store.update(|s| {
            let facts = &mut s.facts;
            if !facts.is_initialized || facts.is_fetching {
                return false;
            }
            facts.is_fetching = true;
            facts.is_error = false;
            true
        });
        if !started {
            debug!("fetch_fact skipped for {}", id);
            return FetchOutcome::Skipped;
        }

        let services = self.store.services();
        match services.facts.get_fact(id).await {
            Ok(fact) => {
                let now = services.clock.now();
                self.store.update(|s| {
                    let facts = &mut s.facts;
                    facts.pool.retain(|pooled| pooled != id);
                    facts.fact = Some(fact);
                    facts.timestamp = Some(now);
                    facts.is_fetching = false;
                });
                FetchOutcome::Fetched
            }
            Err(e) => self.fail("fetch_fact", e.message().unwrap_or(FACT_ERROR)),
        }
    }

    /// Shows a random fact from the pool. An empty pool needs a refill first.
    pub async fn next_fact(&self) -> FetchOutcome {
        let picked = self
            .store
            .read(|s| s.facts.pool.choose(&mut rand::thread_rng()).cloned());
        match picked {
            Some(id) => self.fetch_fact(&id).await,
            None => {
                debug!("next_fact: pool is empty");
                FetchOutcome::Failed
            }
        }
    }

    /// Clears the fact, the pool and the paging offset.
    pub fn reset(&self) {
        self.store.update(|s| {
            let initialized = s.facts.is_initialized;
            s.facts = FactsState {
                is_initialized: initialized,
                ..FactsState::default()
            };
        });
    }

    pub fn reset_initialized(&self) {
        self.store.update(|s| s.facts.is_initialized = false);
    }
}
