mod sync_primitive_pool;

pub use self::sync_primitive_pool::SyncPrimitivePool;
