use std::time::{Duration, Instant};

use sqlx::PgPool;

/// Round-trip time of a trivial query.
pub(crate) async fn ping(pool: &PgPool) -> Result<Duration, sqlx::Error> {
    let started = Instant::now();
    let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    Ok(started.elapsed())
}
