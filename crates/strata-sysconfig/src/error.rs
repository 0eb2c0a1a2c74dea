use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use crate::Error;
use crate::option::OptionKey;

/// 解析阶段的致命错误分类。
///
/// ### 设计目的（Why）
/// - 原始系统用预处理器 `#error` 在编译期阻断矛盾配置；此处将同一批健全性检查
///   重构为解析期错误分类，保持“依赖代码运行之前即失败”的语义。
/// - 稳定枚举便于构建系统与 CI 对失败原因做精确匹配，而非解析错误文案。
///
/// ### 逻辑解析（How）
/// - `BackendNotSelected` / `BackendConflict`：两个后端开关一个都没开 / 同时打开。
/// - `LockingNotSelected` / `LockingConflict`：三个锁策略开关零选 / 多选。
/// - `NumericRangeOverlap`：错误码窗口与事件码窗口相交，或触及非正数保留域。
/// - `CapacityOverrideForbidden`：嵌入式后端试图独立覆盖载荷容量上限。
/// - `SizingUnderflow`：要求严格为正的推导常量解析结果 ≤ 0。
/// - `InvalidOptionValue`：选项携带了与声明不符的值类型或超出表示范围的数值。
///
/// ### 契约说明（What）
/// - 除 [`CodeMapError`] 外，所有成员一经检出即中止解析，绝不以默认值“治愈”矛盾。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolutionErrorKind {
    BackendNotSelected,
    BackendConflict,
    LockingNotSelected,
    LockingConflict,
    NumericRangeOverlap,
    CapacityOverrideForbidden,
    SizingUnderflow,
    InvalidOptionValue,
}

impl ResolutionErrorKind {
    /// 返回分类的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BackendNotSelected => "backend-not-selected",
            Self::BackendConflict => "backend-conflict",
            Self::LockingNotSelected => "locking-not-selected",
            Self::LockingConflict => "locking-conflict",
            Self::NumericRangeOverlap => "numeric-range-overlap",
            Self::CapacityOverrideForbidden => "capacity-override-forbidden",
            Self::SizingUnderflow => "sizing-underflow",
            Self::InvalidOptionValue => "invalid-option-value",
        }
    }
}

impl fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析致命错误：分类、上下文与引发冲突的选项标识。
///
/// ### 设计目的（Why）
/// - 排障的第一问题永远是“哪两个选项打架了”；错误体因此显式携带冲突双方的键，
///   而不是只给一句文案。
///
/// ### 契约说明（What）
/// - `kind`：稳定分类，见 [`ResolutionErrorKind`]。
/// - `context`：人类可读说明；`Cow` 允许常量与动态拼接并存。
/// - `options`：牵涉的选项标识，通常为一到两个，按报告顺序排列。
///
/// ### 设计取舍（Trade-offs）
/// - 未内置数值错误码：本错误只存在于构建解析期，消费者是人与构建系统，
///   不参与运行期错误码窗口。
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionError {
    kind: ResolutionErrorKind,
    context: Cow<'static, str>,
    options: Vec<OptionKey>,
}

impl ResolutionError {
    /// 构造不关联具体选项的错误。
    pub fn new<C>(kind: ResolutionErrorKind, context: C) -> Self
    where
        C: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into(),
            options: Vec::new(),
        }
    }

    /// 构造并标注牵涉的选项标识。
    pub fn with_options<C, I>(kind: ResolutionErrorKind, context: C, options: I) -> Self
    where
        C: Into<Cow<'static, str>>,
        I: IntoIterator<Item = OptionKey>,
    {
        Self {
            kind,
            context: context.into(),
            options: options.into_iter().collect(),
        }
    }

    /// 返回错误分类。
    #[inline]
    pub fn kind(&self) -> ResolutionErrorKind {
        self.kind
    }

    /// 返回上下文说明。
    #[inline]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// 返回牵涉的选项标识。
    #[inline]
    pub fn options(&self) -> &[OptionKey] {
        &self.options
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.context)?;
        if !self.options.is_empty() {
            f.write_str(" (options: ")?;
            for (index, key) in self.options.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

/// 码值映射的局部错误。
///
/// ### 设计目的（Why）
/// - 调用方请求超出窗口宽度的相对码属于调用点误用，语义上可由调用方恢复，
///   不应升级为全局解析失败；因此与 [`ResolutionError`] 分离为独立类型。
///
/// ### 契约说明（What）
/// - `OutOfRange`：请求的相对码不在 `[0, width)` 内，携带请求值与窗口宽度。
/// - 该错误只以普通 `Result` 形式出现在映射调用点，不会中止任何流程。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodeMapError {
    OutOfRange { requested: i32, width: i32 },
}

impl fmt::Display for CodeMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { requested, width } => write!(
                f,
                "code {requested} is outside the configured window [0, {width})"
            ),
        }
    }
}

impl Error for CodeMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

const _: fn() = || {
    fn assert_error_traits<T: Error + Send + Sync + 'static>() {}

    assert_error_traits::<ResolutionError>();
    assert_error_traits::<CodeMapError>();
};
