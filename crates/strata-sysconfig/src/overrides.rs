use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::option::{OptionEntry, OptionKey, OptionValue, Provenance};

/// 覆盖输入的层级。
///
/// ### 设计目的（Why）
/// - 原始系统用层叠的头文件包含表达“工程覆盖 → 平台覆盖 → 系统层覆盖 → 外部定义”
///   的优先序；此处重构为显式的数据层级，与文件系统的物理供给方式解耦。
///
/// ### 逻辑说明（How）
/// - 变体按优先级升序声明：`External` 覆盖 `Layer`，依次类推；`rank` 给出数值序。
///
/// ### 契约定义（What）
/// - 每个层级对应一个 [`Provenance`] 来源标记，写入生效值时一并记录。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverrideTier {
    Project,
    Platform,
    Layer,
    External,
}

impl OverrideTier {
    /// 优先级数值，越大越优先。
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Project => 1,
            Self::Platform => 2,
            Self::Layer => 3,
            Self::External => 4,
        }
    }

    /// 返回层级的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Platform => "platform",
            Self::Layer => "layer",
            Self::External => "external",
        }
    }

    /// 该层级写入的值对应的来源标记。
    pub const fn provenance(self) -> Provenance {
        match self {
            Self::Project => Provenance::ProjectOverride,
            Self::Platform => Provenance::PlatformOverride,
            Self::Layer => Provenance::LayerOverride,
            Self::External => Provenance::External,
        }
    }
}

impl fmt::Display for OverrideTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个覆盖层：一个层级加一组键值对。
///
/// ### 契约说明（What）
/// - `entries`：若同一键在层内出现多次，以最后一次为准（与教科书式“后写覆盖”一致）。
/// - 层本身不做校验；矛盾检测统一推迟到解析与校验阶段。
#[derive(Clone, Debug, PartialEq)]
pub struct OverrideLayer {
    pub tier: OverrideTier,
    pub entries: Vec<(OptionKey, OptionValue)>,
}

impl OverrideLayer {
    /// 构造空的覆盖层。
    pub fn new(tier: OverrideTier) -> Self {
        Self {
            tier,
            entries: Vec::new(),
        }
    }

    /// 链式追加一条覆盖项。
    pub fn with(mut self, key: OptionKey, value: OptionValue) -> Self {
        self.entries.push((key, value));
        self
    }

    /// 追加一条覆盖项。
    pub fn push(&mut self, key: OptionKey, value: OptionValue) {
        self.entries.push((key, value));
    }
}

/// 覆盖链：按固定优先序合并四类覆盖输入与内建默认值。
///
/// ### 设计目的（Why）
/// - 把“谁先被包含谁生效”的预处理器语义重构为纯数据合并：给定同样的输入层，
///   任意次求值得到完全一致的结果（幂等、确定性），不依赖求值次数与外部状态。
///
/// ### 逻辑解析（How）
/// 1. 以内建默认值铺底，来源标记为 [`Provenance::Default`]。
/// 2. 将各层按 `rank` 从低到高排序后依次套用；层内按声明顺序写入。
/// 3. 低优先级来源写入已被更高优先级占据的键时静默跳过（no-op），高优先级始终胜出。
///
/// ### 契约定义（What）
/// - **后置条件**：每个已知键恰好产生一条 [`OptionEntry`]；产物为 `BTreeMap`，
///   遍历顺序确定，便于快照哈希与审计比对。
/// - 本组件不做任何合法性校验，只负责产出选项集。
///
/// ### 设计取舍（Trade-offs）
/// - 未识别的键同样参与合并并保留来源：解析器只消费它认识的键，多余键对下游无害，
///   但保留在产物中有助于发现拼写错误。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideChain {
    layers: Vec<OverrideLayer>,
}

impl OverrideChain {
    /// 构造空覆盖链。
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式追加一个覆盖层。
    pub fn with_layer(mut self, layer: OverrideLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// 追加一个覆盖层。
    pub fn push_layer(&mut self, layer: OverrideLayer) {
        self.layers.push(layer);
    }

    /// 返回当前已注册的层。
    #[inline]
    pub fn layers(&self) -> &[OverrideLayer] {
        &self.layers
    }

    /// 以给定默认值为底座，合并出全部选项的生效记录。
    pub fn resolve(
        &self,
        defaults: &[(OptionKey, OptionValue)],
    ) -> BTreeMap<OptionKey, OptionEntry> {
        let mut effective = BTreeMap::new();
        for (key, value) in defaults {
            effective.insert(
                key.clone(),
                OptionEntry::new(key.clone(), value.clone(), Provenance::Default),
            );
        }

        let mut ordered: Vec<&OverrideLayer> = self.layers.iter().collect();
        ordered.sort_by_key(|layer| layer.tier.rank());

        for layer in ordered {
            let provenance = layer.tier.provenance();
            for (key, value) in &layer.entries {
                match effective.get(key) {
                    // 已被更高优先级占据：静默 no-op。
                    Some(existing) if existing.provenance > provenance => {}
                    _ => {
                        effective.insert(
                            key.clone(),
                            OptionEntry::new(key.clone(), value.clone(), provenance),
                        );
                    }
                }
            }
        }

        effective
    }
}
