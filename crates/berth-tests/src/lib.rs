use berth_core::Config;
use eyre::{eyre, Result};
use project_settings::ProjectSettings;

mod api;
mod project_settings;
pub use api::{Api, ApiError, ApiResponse, ApiResult};

pub struct TestCtxBuilder {
    /// Count of worker threads handing requests to the booking office
    pub workers: u16,
    /// Configuration the booking office is launched with
    pub config: Config,
}

impl TestCtxBuilder {
    /// Create a new test context builder initialized with environment defaults
    pub fn from_env() -> Result<Self> {
        let settings = ProjectSettings::load()?;
        if settings.workers == 0 {
            return Err(eyre!("at least one worker is required"));
        }

        Ok(TestCtxBuilder {
            workers: settings.workers,
            config: settings.config,
        })
    }

    /// Set the number of worker threads to use
    pub fn with_workers(mut self, workers: u16) -> Self {
        assert_ne!(workers, 0);
        self.workers = workers;
        self
    }

    /// Seed the berth selection
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Whether waitlisted tickets moving to RAC get a fresh creation time
    pub fn with_restamp(mut self, restamp: bool) -> Self {
        self.config.restamp_on_promotion = restamp;
        self
    }

    /// Whether berthless child tickets count against the confirmed tier
    pub fn with_children_hold_confirmed(mut self, hold: bool) -> Self {
        self.config.children_hold_confirmed = hold;
        self
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let (office, api) = api::mock::start(self.workers, self.config).await;

        Ok(TestCtx {
            api,
            office,
            config: self.config,
            workers: self.workers,
            drop_bomb: DropBomb,
        })
    }
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the booking office
    pub api: Api,
    office: api::mock::MockOffice,
    /// Configuration of the booking office
    pub config: Config,
    /// Number of worker threads
    pub workers: u16,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// Shut down the booking office and finish the test
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        self.office.shutdown().await;
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the booking office down");
    }
}
