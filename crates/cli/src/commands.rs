use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy tables from the hosted store into the local database
    /// (transactional, idempotent upsert).
    Migrate {
        #[arg(long, help = "Table to migrate (rollout_sites, site_scores, program_targets)")]
        table: Option<String>,

        #[arg(long, help = "Migrate every known table", conflicts_with = "table")]
        all: bool,

        #[arg(long, help = "Delete all existing target rows before writing")]
        clear: bool,
    },

    /// Clear and reload one table with per-batch tolerance (best effort,
    /// batch failures are logged and skipped, not rolled back).
    Reload {
        #[arg(long, help = "Table to reload")]
        table: String,
    },

    /// Report column-set differences between a source sample and the
    /// target catalog. Read-only.
    CompareStructure {
        #[arg(long, help = "Table to compare")]
        table: String,

        #[arg(long, default_value_t = 50, help = "Source sample size")]
        limit: usize,
    },

    /// Field-by-field sample comparison keyed by natural key. Read-only.
    CompareSamples {
        #[arg(long, help = "Table to compare")]
        table: String,

        #[arg(long, default_value_t = 50, help = "Rows sampled per side")]
        limit: usize,

        #[arg(long, help = "Restrict the source sample to one rollout program")]
        program: Option<String>,
    },

    /// Probe connectivity of both stores.
    TestConn,
}
