use core::fmt;
use core::num::NonZeroU32;

use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::resolver::keys;
use crate::selector::BackendSelection;

/// 消息头各字段的固定开销（字节）。
///
/// 逐字段列出而非只给总和，便于协议演进时核对：
///
/// - 帧长度 2、消息头 2、消息 Id 4、源节点 Id 8、目的节点 Id 8、密钥 Id 2；
/// - 交换层：应用版本 1、消息类型 1、交换 Id 2、Profile Id 4、已确认消息 Id 4。
///
/// 其中多数字段是可选的，实际报文头通常远小于保留值。
pub mod overhead {
    /// 帧长度字段。
    pub const FRAME_LENGTH: u32 = 2;
    /// 消息头字段。
    pub const MESSAGE_HEADER: u32 = 2;
    /// 消息 Id 字段。
    pub const MESSAGE_ID: u32 = 4;
    /// 源节点 Id 字段。
    pub const SOURCE_NODE_ID: u32 = 8;
    /// 目的节点 Id 字段。
    pub const DESTINATION_NODE_ID: u32 = 8;
    /// 密钥 Id 字段。
    pub const KEY_ID: u32 = 2;

    /// 消息头合计。
    pub const MESSAGE_RESERVE: u32 = FRAME_LENGTH
        + MESSAGE_HEADER
        + MESSAGE_ID
        + SOURCE_NODE_ID
        + DESTINATION_NODE_ID
        + KEY_ID;

    /// 交换层：应用版本字段。
    pub const APPLICATION_VERSION: u32 = 1;
    /// 交换层：消息类型字段。
    pub const MESSAGE_TYPE: u32 = 1;
    /// 交换层：交换 Id 字段。
    pub const EXCHANGE_ID: u32 = 2;
    /// 交换层：Profile Id 字段。
    pub const PROFILE_ID: u32 = 4;
    /// 交换层：已确认消息 Id 字段。
    pub const ACKNOWLEDGED_MESSAGE_ID: u32 = 4;

    /// 交换头合计。
    pub const EXCHANGE_RESERVE: u32 =
        APPLICATION_VERSION + MESSAGE_TYPE + EXCHANGE_ID + PROFILE_ID + ACKNOWLEDGED_MESSAGE_ID;

    /// 与后端无关的基础头部保留量（38 字节）。
    pub const BASE_HEADER_RESERVE: u32 = MESSAGE_RESERVE + EXCHANGE_RESERVE;
}

/// 宿主套接字后端的默认最大载荷容量。
///
/// 取值覆盖期望的路径 MTU 加隧道 / 加密封装开销；仅套接字后端允许覆盖。
pub const DEFAULT_PAYLOAD_CAPACITY_MAX: u32 = 1583;
/// 默认缓冲池容量；`0` 是“无界、走动态分配”的哨兵值。
pub const DEFAULT_BUFFER_POOL_MAX: u32 = 15;
/// 默认定时器池容量。
pub const DEFAULT_TIMER_POOL_MAX: u32 = 32;

/// 嵌入式协议栈自身的几何事实。
///
/// ### 设计目的（Why）
/// - 嵌入式后端的下层链路 / IP / 传输层头部开销与缓冲几何由协议栈自己的配置决定，
///   系统层必须原样读取，绝不自行重推导——两边一旦各算各的，就会悄悄偏离
///   协议栈实际分配的缓冲大小。
///
/// ### 契约说明（What）
/// - `link_header` / `ip_header` / `transport_header`：层 2 至层 4 的头部保留量。
/// - `buffer_capacity`：协议栈单个缓冲可用于报文的总字节数（几何事实，不含
///   缓冲结构体本身）。
///
/// ### 设计取舍（Trade-offs）
/// - `Default` 给出经典以太网 + IPv4 + TCP（14/20/20）与常见池缓冲几何，
///   仅为宿主侧模拟方便；真实嵌入式构建应从协议栈配置注入实际值。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EmbeddedStackFacts {
    pub link_header: u32,
    pub ip_header: u32,
    pub transport_header: u32,
    pub buffer_capacity: u32,
}

impl EmbeddedStackFacts {
    /// 以显式几何事实构造。
    pub const fn new(
        link_header: u32,
        ip_header: u32,
        transport_header: u32,
        buffer_capacity: u32,
    ) -> Self {
        Self {
            link_header,
            ip_header,
            transport_header,
            buffer_capacity,
        }
    }

    /// 下层头部开销合计；以 `u64` 返回，三项求和不会回绕。
    #[inline]
    pub const fn lower_layer_reserve(self) -> u64 {
        self.link_header as u64 + self.ip_header as u64 + self.transport_header as u64
    }
}

impl Default for EmbeddedStackFacts {
    fn default() -> Self {
        // 以太网 14 + IPv4 20 + TCP 20；池缓冲几何取 1664 字节。
        Self::new(14, 20, 20, 1664)
    }
}

/// 缓冲池的容量上限。
///
/// ### 设计目的（Why）
/// - 选项值 `0` 是一个刻意的哨兵：表示“无界、使用动态分配”，而不是零容量池。
///   用枚举把这两种语义在类型层面分开，下游永远不会误建一个零槽位的池。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferPoolLimit {
    /// 无界，按需动态分配。
    Unbounded,
    /// 预分配固定槽位。
    Bounded(NonZeroU32),
}

impl BufferPoolLimit {
    /// 从原始选项值构造；`0` 映射为 [`BufferPoolLimit::Unbounded`]。
    pub fn from_raw(raw: i64) -> Result<Self, ResolutionError> {
        match raw {
            0 => Ok(Self::Unbounded),
            n if n > 0 && n <= u32::MAX as i64 => {
                // n 已验证非零且在 u32 范围内。
                let slots = NonZeroU32::new(n as u32).ok_or_else(|| {
                    ResolutionError::with_options(
                        ResolutionErrorKind::SizingUnderflow,
                        "buffer pool size collapsed to zero",
                        [keys::BUFFER_POOL_MAX],
                    )
                })?;
                Ok(Self::Bounded(slots))
            }
            _ => Err(ResolutionError::with_options(
                ResolutionErrorKind::InvalidOptionValue,
                "buffer-pool-max must be a non-negative 32-bit count",
                [keys::BUFFER_POOL_MAX],
            )),
        }
    }

    /// 返回有界槽位数；无界时为 `None`。
    #[inline]
    pub const fn slots(self) -> Option<NonZeroU32> {
        match self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(n),
        }
    }

    /// 是否为无界 / 动态分配模式。
    #[inline]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl fmt::Display for BufferPoolLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Bounded(n) => write!(f, "{n}"),
        }
    }
}

/// 尺寸推导的最终产物。
///
/// ### 契约定义（What）
/// - 全部字段在解析期一次算毕，均为纯求和 / 纯收窄的结果，不存在前向引用：
///   任何字段只依赖后端选择与解析时已知的开销事实。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SizingPlan {
    /// 网络缓冲头部保留字节数。
    pub header_reserve_size: u32,
    /// 应用可用的最大载荷字节数。
    pub payload_capacity_max: u32,
    /// 缓冲池容量上限。
    pub buffer_pool: BufferPoolLimit,
    /// 定时器池槽位数。
    pub timer_pool_max: u32,
}

/// 推导头部保留量。
///
/// ### 逻辑解析（How）
/// - 宿主套接字：仅基础保留量（默认 38）。
/// - 嵌入式协议栈：基础保留量加下层链路 / IP / 传输头开销（默认 38 + 14 + 20 + 20 = 92）。
/// - 两种情形是硬分叉，绝不取均值或猜测；下层开销一律来自 [`EmbeddedStackFacts`]。
/// - 求和在 `u64` 域进行；合计超出 32 位表示时报
///   [`ResolutionErrorKind::InvalidOptionValue`]，绝不回绕成微小保留量。
pub fn derive_header_reserve(
    backend: BackendSelection,
    base_reserve: u32,
    facts: &EmbeddedStackFacts,
) -> Result<u32, ResolutionError> {
    let total = match backend {
        BackendSelection::HostSockets => base_reserve as u64,
        BackendSelection::EmbeddedStack => base_reserve as u64 + facts.lower_layer_reserve(),
    };
    u32::try_from(total).map_err(|_| {
        ResolutionError::with_options(
            ResolutionErrorKind::InvalidOptionValue,
            "header reserve overflows the 32-bit size representation",
            [keys::HEADER_RESERVE_SIZE],
        )
    })
}

/// 推导最大载荷容量。
///
/// ### 逻辑解析（How）
/// - 宿主套接字：使用（可覆盖的）显式上限。
/// - 嵌入式协议栈：完全由协议栈缓冲几何推导——可用载荷 = 缓冲容量 - 头部保留量；
///   结果必须严格为正，否则报 [`ResolutionErrorKind::SizingUnderflow`]。
pub fn derive_payload_capacity(
    backend: BackendSelection,
    explicit_capacity: u32,
    header_reserve: u32,
    facts: &EmbeddedStackFacts,
) -> Result<u32, ResolutionError> {
    match backend {
        BackendSelection::HostSockets => {
            if explicit_capacity == 0 {
                return Err(ResolutionError::with_options(
                    ResolutionErrorKind::SizingUnderflow,
                    "payload capacity must be strictly positive",
                    [keys::PAYLOAD_CAPACITY_MAX],
                ));
            }
            Ok(explicit_capacity)
        }
        BackendSelection::EmbeddedStack => {
            if facts.buffer_capacity <= header_reserve {
                return Err(ResolutionError::with_options(
                    ResolutionErrorKind::SizingUnderflow,
                    "stack buffer geometry leaves no room for application payload",
                    [keys::HEADER_RESERVE_SIZE, keys::PAYLOAD_CAPACITY_MAX],
                ));
            }
            Ok(facts.buffer_capacity - header_reserve)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_backend_reserves_base_only() {
        let reserve = derive_header_reserve(
            BackendSelection::HostSockets,
            overhead::BASE_HEADER_RESERVE,
            &EmbeddedStackFacts::default(),
        )
        .expect("base reserve fits");
        assert_eq!(reserve, 38);
    }

    #[test]
    fn embedded_backend_adds_lower_layer_overheads() {
        let facts = EmbeddedStackFacts::new(14, 20, 20, 1664);
        let reserve = derive_header_reserve(
            BackendSelection::EmbeddedStack,
            overhead::BASE_HEADER_RESERVE,
            &facts,
        )
        .expect("default geometry fits");
        assert_eq!(reserve, 92);
    }

    #[test]
    fn header_reserve_overflow_is_a_fatal_error() {
        let facts = EmbeddedStackFacts::new(14, 20, 20, 1664);
        let err = derive_header_reserve(BackendSelection::EmbeddedStack, u32::MAX, &facts)
            .unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::InvalidOptionValue);
        assert_eq!(err.options(), &[keys::HEADER_RESERVE_SIZE]);
        // 极端的几何事实同样不得回绕。
        let degenerate = EmbeddedStackFacts::new(u32::MAX, u32::MAX, u32::MAX, 1664);
        assert!(derive_header_reserve(BackendSelection::EmbeddedStack, 38, &degenerate).is_err());
    }

    #[test]
    fn embedded_capacity_follows_buffer_geometry() {
        let facts = EmbeddedStackFacts::new(14, 20, 20, 1664);
        let capacity = derive_payload_capacity(BackendSelection::EmbeddedStack, 0, 92, &facts)
            .expect("geometry leaves payload room");
        assert_eq!(capacity, 1664 - 92);
    }

    #[test]
    fn degenerate_geometry_is_an_underflow() {
        let facts = EmbeddedStackFacts::new(14, 20, 20, 90);
        let err = derive_payload_capacity(BackendSelection::EmbeddedStack, 0, 92, &facts)
            .unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::SizingUnderflow);
    }

    #[test]
    fn zero_buffer_pool_means_unbounded() {
        assert_eq!(
            BufferPoolLimit::from_raw(0).expect("sentinel"),
            BufferPoolLimit::Unbounded
        );
        let bounded = BufferPoolLimit::from_raw(15).expect("bounded");
        assert_eq!(bounded.slots().map(NonZeroU32::get), Some(15));
        assert!(BufferPoolLimit::from_raw(-1).is_err());
    }
}
