
use gateway_types::models::{CredentialRecord, PoolConfig};
use serde_json::json;

use super::CredentialPool;

pub(super) fn make_record(id: &str) -> CredentialRecord {
    CredentialRecord::new(
        id.to_string(),
        json!({"access_token": format!("token_{id}"), "email": format!("{id}@example.com")}),
    )
}

pub(super) fn create_test_pool(ids: &[&str], calls_per_rotation: u32) -> CredentialPool {
    let config = PoolConfig { calls_per_rotation, ..PoolConfig::default() };
    CredentialPool::with_records(config, ids.iter().map(|id| make_record(id)).collect(), None)
}
