use core_types::Period;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsCacheError {
    #[error("Store error: {0}")]
    Store(#[from] database::DbError),

    #[error("Period {0} is not enabled in the statistics cache configuration.")]
    PeriodNotEnabled(Period),
}
