pub use crate::builder::CacheBuilder;
pub use crate::concurrent::manager::{ConcurrentCacheManager, ConcurrentStatsSnapshot};
pub use crate::concurrent::pool::{TaskHandle, WorkerPool};
pub use crate::error::{CacheError, ConfigError};
pub use crate::manager::{CacheManager, WorkloadAdvice};
pub use crate::policy::CachePolicy;
pub use crate::stats::{CacheStatistics, HotEntryInfo};
pub use crate::traits::PolicyCache;
