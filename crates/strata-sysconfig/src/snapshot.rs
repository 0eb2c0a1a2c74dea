use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::option::OptionValue;
use crate::resolver::ResolvedConfiguration;

/// 快照中单个选项的序列化表示。
///
/// ### 契约说明（What）
/// - `key`：`domain::name` 形式的稳定字符串。
/// - `value`：展平后的标量值。
/// - `provenance`：生效值来源的稳定字符串，供审计判断覆盖关系。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: SnapshotValue,
    pub provenance: String,
}

/// 快照中的标量值。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SnapshotValue {
    Boolean { value: bool },
    Integer { value: i64 },
    Text { value: String },
}

impl From<&OptionValue> for SnapshotValue {
    fn from(value: &OptionValue) -> Self {
        match value {
            OptionValue::Boolean(v) => Self::Boolean { value: *v },
            OptionValue::Integer(v) => Self::Integer { value: *v },
            OptionValue::Text(v) => Self::Text {
                value: v.to_string(),
            },
        }
    }
}

/// 已解析配置的审计快照。
///
/// ### 设计目的（Why）
/// - 构建产物需要能落盘比对：同一输入的两次构建必须产出逐字节一致的快照，
///   据此发现环境泄漏进构建决策的问题。
///
/// ### 逻辑说明（How）
/// - 决策字段展平为稳定字符串；选项表按 `BTreeMap` 的确定顺序导出。
///
/// ### 契约说明（What）
/// - 快照只读不可变，不反向参与任何解析决策。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub backend: String,
    pub locking: String,
    pub clock: String,
    pub error_range_base: i32,
    pub error_range_width: i32,
    pub first_unreserved_event_code: Option<i32>,
    pub header_reserve_size: u32,
    pub payload_capacity_max: u32,
    pub buffer_pool_max: Option<u32>,
    pub timer_pool_max: u32,
    pub statistics_enabled: bool,
    pub entries: Vec<SnapshotEntry>,
}

impl ConfigSnapshot {
    /// 从解析产物构造快照。
    pub fn from_resolved(config: &ResolvedConfiguration) -> Self {
        let range = config.error_codes.range();
        Self {
            backend: config.backend.to_string(),
            locking: config.locking.to_string(),
            clock: config.clock.to_string(),
            error_range_base: range.base,
            error_range_width: range.width,
            first_unreserved_event_code: config
                .event_codes
                .map(|events| events.first_unreserved()),
            header_reserve_size: config.sizing.header_reserve_size,
            payload_capacity_max: config.sizing.payload_capacity_max,
            buffer_pool_max: config.sizing.buffer_pool.slots().map(|n| n.get()),
            timer_pool_max: config.sizing.timer_pool_max,
            statistics_enabled: config.statistics_enabled,
            entries: config
                .options
                .values()
                .map(|entry| SnapshotEntry {
                    key: entry.key.to_string(),
                    value: SnapshotValue::from(&entry.value),
                    provenance: entry.provenance.to_string(),
                })
                .collect(),
        }
    }

    /// 渲染为 JSON 文本。
    #[cfg(feature = "std_json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionValue;
    use crate::overrides::{OverrideChain, OverrideLayer, OverrideTier};
    use crate::resolver::{SystemConfigResolver, keys};

    fn snapshot() -> ConfigSnapshot {
        let chain = OverrideChain::new().with_layer(
            OverrideLayer::new(OverrideTier::External)
                .with(keys::USE_SOCKETS, OptionValue::Boolean(true)),
        );
        let resolved = SystemConfigResolver::new()
            .with_chain(chain)
            .resolve()
            .expect("baseline");
        ConfigSnapshot::from_resolved(&resolved)
    }

    #[test]
    fn snapshot_reflects_decisions() {
        let snap = snapshot();
        assert_eq!(snap.backend, "host-sockets");
        assert_eq!(snap.locking, "mutex");
        assert_eq!(snap.header_reserve_size, 38);
        assert_eq!(snap.payload_capacity_max, 1583);
        assert_eq!(snap.first_unreserved_event_code, None);
        assert_eq!(snap.buffer_pool_max, Some(15));
    }

    #[test]
    fn snapshot_is_byte_stable_across_runs() {
        let a = serde_json::to_string(&snapshot()).expect("serialize a");
        let b = serde_json::to_string(&snapshot()).expect("serialize b");
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_serde_round_trip() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).expect("serialize");
        let back: ConfigSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snap);
    }
}
