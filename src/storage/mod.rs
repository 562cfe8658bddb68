//! SQLite storage for scraped football data
//!
//! Provides the schema, idempotent upserts keyed by natural keys, the
//! serialized-column codec and read queries used by the pipeline.

pub mod codec;
pub mod models;
pub mod repository;
pub mod schema;
pub mod upsert;

pub use models::{
    GoalHistogram, League, NewLeague, NewMatch, NewPlayer, NewTeam, Player, PlayerMatchStats,
    SeasonStats, Team, TeamMatchStats,
};
pub use repository::{EntityCounts, Store};
