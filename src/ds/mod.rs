//! Policy data structures: the order indexes behind the eviction
//! disciplines, plus the shard selector and the bounded access log.

pub mod access_log;
pub mod frequency_buckets;
pub mod order_list;
pub mod shard;
pub mod slot_arena;

pub use access_log::AccessLog;
pub use frequency_buckets::FrequencyBuckets;
pub use order_list::OrderList;
pub use shard::ShardSelector;
pub use slot_arena::{SlotArena, SlotId};
