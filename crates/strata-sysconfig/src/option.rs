use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 配置选项的稳定标识符。
///
/// ### 设计目的（Why）
/// - 遵循 "domain + name" 的命名法，把选项按关注点分域（`backend`、`locking`、`codes`、
///   `sizing` 等），避免平铺命名空间在跨子系统共存时产生冲突。
/// - 借助 `Cow<'static, str>` 同时支持编译期常量键（见 [`keys`](crate::resolver::keys)）
///   与动态构造的键。
///
/// ### 契约定义（What）
/// - **前置条件**：`domain` 与 `name` 推荐使用 `[a-z0-9-]`，跨实现保持稳定。
/// - **后置条件**：实现 `Ord` / `Hash`，可直接作为 `BTreeMap` 键，保证遍历顺序确定。
///
/// ### 设计取舍（Trade-offs）
/// - 未在类型层面引入作用域或版本字段：解析只发生一次、产物不可变，分层治理由
///   覆盖链（[`OverrideChain`](crate::overrides::OverrideChain)）承担。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OptionKey {
    domain: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl OptionKey {
    /// 构造一个新的选项键。
    pub fn new<D, N>(domain: D, name: N) -> Self
    where
        D: Into<Cow<'static, str>>,
        N: Into<Cow<'static, str>>,
    {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// 从静态字符串构造选项键，可用于 `const` 上下文。
    pub const fn from_static(domain: &'static str, name: &'static str) -> Self {
        Self {
            domain: Cow::Borrowed(domain),
            name: Cow::Borrowed(name),
        }
    }

    /// 返回选项所属的域。
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 返回域内名称。
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.domain, self.name)
    }
}

impl PartialOrd for OptionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OptionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.domain
            .cmp(&other.domain)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// 配置值的枚举表示。
///
/// ### 设计目的（Why）
/// - 构建期配置只需要三类标量：布尔开关、整型常量与少量文本标识；强类型枚举
///   避免了传统字符串配置带来的解析歧义。
/// - 选项面向 `no_std` 目标，整型统一为 `i64`，由消费方在收窄时做范围校验。
///
/// ### 契约定义（What）
/// - **后置条件**：所有变体实现 `Clone` / `PartialEq`，适用于快照、合并与比对。
/// - serde 序列化经由内部 repr 枚举完成，带 `kind` 标签，保证跨版本可演进。
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Text(Cow<'static, str>),
}

impl OptionValue {
    /// 以布尔视角读取；类型不符返回 `None`。
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// 以整型视角读取；类型不符返回 `None`。
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// 以文本视角读取；类型不符返回 `None`。
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// 返回变体的稳定类型名，用于错误上下文拼接。
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        OptionValueRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OptionValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = OptionValueRepr::deserialize(deserializer)?;
        Ok(repr.into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OptionValueRepr {
    Boolean { value: bool },
    Integer { value: i64 },
    Text { value: String },
}

impl From<&OptionValue> for OptionValueRepr {
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

impl From<OptionValueRepr> for OptionValue {
    fn from(repr: OptionValueRepr) -> Self {
        match repr {
            OptionValueRepr::Boolean { value } => OptionValue::Boolean(value),
            OptionValueRepr::Integer { value } => OptionValue::Integer(value),
            OptionValueRepr::Text { value } => OptionValue::Text(Cow::Owned(value)),
        }
    }
}

/// 选项生效值的来源。
///
/// ### 设计目的（Why）
/// - 覆盖链的优先序必须可追溯：同一键可能被多个来源写入，唯一生效值的出处
///   决定了后续校验（例如嵌入式后端禁止覆盖载荷上限）能否成立。
///
/// ### 逻辑说明（How）
/// - 变体按优先级升序声明，`derive(Ord)` 即给出全序：
///   `External > LayerOverride > PlatformOverride > ProjectOverride > Default`。
///
/// ### 契约定义（What）
/// - 解析完成后，每个键恰好保留一条带来源的生效记录（[`OptionEntry`]）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provenance {
    Default,
    ProjectOverride,
    PlatformOverride,
    LayerOverride,
    External,
}

impl Provenance {
    /// 返回来源的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ProjectOverride => "project-override",
            Self::PlatformOverride => "platform-override",
            Self::LayerOverride => "layer-override",
            Self::External => "externally-supplied",
        }
    }

    /// 是否由外部输入（而非内建默认值）决定。
    #[inline]
    pub const fn is_overridden(self) -> bool {
        !matches!(self, Self::Default)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一条解析后的选项记录：键、生效值与来源。
#[derive(Clone, Debug, PartialEq)]
pub struct OptionEntry {
    pub key: OptionKey,
    pub value: OptionValue,
    pub provenance: Provenance,
}

impl OptionEntry {
    /// 构造选项记录。
    pub fn new(key: OptionKey, value: OptionValue, provenance: Provenance) -> Self {
        Self {
            key,
            value,
            provenance,
        }
    }
}
