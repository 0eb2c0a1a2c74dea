use core::fmt;

use crate::error::CodeMapError;

/// 一段半开数值区间 `[base, base + width)`。
///
/// ### 设计目的（Why）
/// - 多个子系统共享同一平台的全局错误码 / 事件码空间时，经典做法是“划出一扇窗口，
///   只对外暴露相对偏移”；窗口本身用 `(base, width)` 表达即可整体平移而无需改动调用点。
///
/// ### 契约定义（What）
/// - **前置条件**：`width >= 0`；`width == 0` 表示空窗口，与任何区间都不相交。
/// - `is_disjoint`：当且仅当不存在同时落入两窗口的值时为真。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NumericRange {
    pub base: i32,
    pub width: i32,
}

impl NumericRange {
    /// 构造数值窗口。
    #[inline]
    pub const fn new(base: i32, width: i32) -> Self {
        Self { base, width }
    }

    /// 窗口上界（不含）。
    #[inline]
    pub const fn end(self) -> i64 {
        self.base as i64 + self.width as i64
    }

    /// 判断给定值是否落入窗口。
    #[inline]
    pub const fn contains(self, value: i32) -> bool {
        self.width > 0 && value >= self.base && (value as i64) < self.end()
    }

    /// 判断两个窗口是否互不相交。
    #[inline]
    pub const fn is_disjoint(self, other: NumericRange) -> bool {
        if self.width <= 0 || other.width <= 0 {
            return true;
        }
        self.end() <= other.base as i64 || other.end() <= self.base as i64
    }

    /// 窗口是否完全落在严格正数域内。
    #[inline]
    pub const fn is_strictly_positive(self) -> bool {
        self.base > 0 && self.width > 0
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.base, self.end())
    }
}

/// 子系统错误码窗口。
///
/// ### 设计目的（Why）
/// - 错误码以“窗口基址 + 相对偏移”的形式对外发布：调用点只持有相对偏移，
///   窗口整体平移（例如与兄弟子系统重新划分空间）不需要重新编号。
///
/// ### 契约说明（What）
/// - `map(n) = base + n`，在 `[0, width)` 上是到 `[base, base + width)` 的双射；
///   域外请求返回 [`CodeMapError::OutOfRange`]，由调用点自行处理，不会中止解析。
/// - `unmap` 为其逆映射，同样对域外输入返回错误而非静默回绕。
///
/// ### 设计取舍（Trade-offs）
/// - 底层表示固定为 `i32`（对应原始系统的 32 位带符号错误类型）；窗口合法性
///   （严格为正、不溢出）由解析器与校验引擎保证，映射自身对越界窗口也只返回
///   错误，不做任何回绕。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCodeSpace {
    range: NumericRange,
}

impl ErrorCodeSpace {
    /// 默认窗口基址。
    pub const DEFAULT_BASE: i32 = 7000;
    /// 默认窗口宽度（覆盖 7000..=7999）。
    pub const DEFAULT_WIDTH: i32 = 1000;

    /// 以给定窗口构造错误码空间。
    #[inline]
    pub const fn new(range: NumericRange) -> Self {
        Self { range }
    }

    /// 返回底层窗口。
    #[inline]
    pub const fn range(self) -> NumericRange {
        self.range
    }

    /// 把相对偏移映射为绝对错误码。
    ///
    /// 求和在 `i64` 域进行：直接构造的窗口若越过 `i32` 上界，域内偏移同样
    /// 返回 [`CodeMapError::OutOfRange`] 而不是回绕。
    pub fn map(self, offset: i32) -> Result<i32, CodeMapError> {
        if offset < 0 || offset >= self.range.width {
            return Err(CodeMapError::OutOfRange {
                requested: offset,
                width: self.range.width,
            });
        }
        i32::try_from(self.range.base as i64 + offset as i64).map_err(|_| {
            CodeMapError::OutOfRange {
                requested: offset,
                width: self.range.width,
            }
        })
    }

    /// 把绝对错误码还原为相对偏移。
    pub fn unmap(self, code: i32) -> Result<i32, CodeMapError> {
        if !self.range.contains(code) {
            return Err(CodeMapError::OutOfRange {
                requested: code,
                width: self.range.width,
            });
        }
        Ok(code - self.range.base)
    }
}

impl Default for ErrorCodeSpace {
    fn default() -> Self {
        Self::new(NumericRange::new(Self::DEFAULT_BASE, Self::DEFAULT_WIDTH))
    }
}

/// 嵌入式后端事件码的整数映射契约。
///
/// ### 设计目的（Why）
/// - 默认情况下事件码即恒等映射（`map(e) = e`）；当嵌入方需要把系统层事件码
///   迁入平台特定的全局编码空间时，可注入自定义双射完成整体搬移。
///
/// ### 契约说明（What）
/// - **前置条件**：实现必须是双射，`unmap(map(e)) == e` 对全部合法 `e` 成立；
///   解析器不验证该性质，由嵌入方的契约测试保障。
pub trait EventCodeMapper {
    /// 把系统层事件码映射到平台编码空间。
    fn map(&self, code: i32) -> i32;

    /// 把平台编码还原为系统层事件码。
    fn unmap(&self, code: i32) -> i32;
}

/// 恒等事件码映射，未配置重映射时的默认行为。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityEventMapper;

impl EventCodeMapper for IdentityEventMapper {
    #[inline]
    fn map(&self, code: i32) -> i32 {
        code
    }

    #[inline]
    fn unmap(&self, code: i32) -> i32 {
        code
    }
}

/// 嵌入式后端的事件码空间（宿主套接字后端没有对应的派发器事件空间）。
///
/// ### 逻辑说明（How）
/// - `[0, first_unreserved)` 保留给系统层自身的内建事件种类。
/// - 嵌入应用只能使用 `first_unreserved` 及以上的码值。
///
/// ### 契约定义（What）
/// - `reserved_range`：系统层占用的保留窗口，参与与错误码窗口的不相交校验。
/// - `map_with`：在注入的 [`EventCodeMapper`] 之上求值；默认恒等映射见
///   [`IdentityEventMapper`]。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventCodeSpace {
    first_unreserved: i32,
}

impl EventCodeSpace {
    /// 默认的首个未保留事件码。
    pub const DEFAULT_FIRST_UNRESERVED: i32 = 32;

    /// 以给定的首个未保留码构造事件码空间。
    #[inline]
    pub const fn new(first_unreserved: i32) -> Self {
        Self { first_unreserved }
    }

    /// 返回首个未保留事件码。
    #[inline]
    pub const fn first_unreserved(self) -> i32 {
        self.first_unreserved
    }

    /// 系统层内建事件占用的保留窗口。
    #[inline]
    pub const fn reserved_range(self) -> NumericRange {
        NumericRange::new(0, self.first_unreserved)
    }

    /// 判断码值是否归嵌入应用使用。
    #[inline]
    pub const fn is_application_code(self, code: i32) -> bool {
        code >= self.first_unreserved
    }

    /// 默认（恒等）映射。
    #[inline]
    pub const fn map(self, code: i32) -> i32 {
        code
    }

    /// 在注入的映射器之上求值。
    #[inline]
    pub fn map_with(self, mapper: &dyn EventCodeMapper, code: i32) -> i32 {
        mapper.map(code)
    }
}

impl Default for EventCodeSpace {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIRST_UNRESERVED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_map_is_total_on_domain() {
        let space = ErrorCodeSpace::default();
        assert_eq!(space.map(0), Ok(7000));
        assert_eq!(space.map(999), Ok(7999));
        assert!(matches!(
            space.map(1000),
            Err(CodeMapError::OutOfRange {
                requested: 1000,
                width: 1000
            })
        ));
        assert!(space.map(-1).is_err());
    }

    #[test]
    fn error_code_round_trip() {
        let space = ErrorCodeSpace::new(NumericRange::new(4000, 16));
        for offset in 0..16 {
            let code = space.map(offset).expect("in-domain offset");
            assert_eq!(space.unmap(code), Ok(offset));
        }
        assert!(space.unmap(3999).is_err());
        assert!(space.unmap(4016).is_err());
    }

    #[test]
    fn map_near_the_i32_ceiling_errors_instead_of_wrapping() {
        let space = ErrorCodeSpace::new(NumericRange::new(i32::MAX - 10, 100));
        assert_eq!(space.map(5), Ok(i32::MAX - 5));
        assert!(space.map(50).is_err());
    }

    #[test]
    fn disjointness_is_symmetric() {
        let errors = NumericRange::new(7000, 1000);
        let events = NumericRange::new(0, 32);
        assert!(errors.is_disjoint(events));
        assert!(events.is_disjoint(errors));
        assert!(!errors.is_disjoint(NumericRange::new(7999, 10)));
    }

    #[test]
    fn empty_range_is_disjoint_from_everything() {
        let empty = NumericRange::new(100, 0);
        assert!(empty.is_disjoint(NumericRange::new(0, 1000)));
        assert!(!empty.contains(100));
    }

    #[test]
    fn event_space_partitions_application_codes() {
        let space = EventCodeSpace::default();
        assert!(!space.is_application_code(31));
        assert!(space.is_application_code(32));
        assert_eq!(space.map(5), 5);
        assert_eq!(space.map_with(&IdentityEventMapper, 5), 5);

        struct Shift(i32);
        impl EventCodeMapper for Shift {
            fn map(&self, code: i32) -> i32 {
                code + self.0
            }
            fn unmap(&self, code: i32) -> i32 {
                code - self.0
            }
        }
        let shifted = Shift(1_000);
        assert_eq!(space.map_with(&shifted, 5), 1_005);
        assert_eq!(shifted.unmap(space.map_with(&shifted, 5)), 5);
    }
}
