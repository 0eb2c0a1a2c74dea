use core::fmt;

use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::resolver::keys;

/// 系统层编译所面向的网络后端。
///
/// ### 设计目的（Why）
/// - 宿主套接字与嵌入式事件驱动协议栈是两套互斥的运行时形态，下游的缓冲、
///   定时器与事件派发子系统都以该选择为分叉点。
///
/// ### 契约定义（What）
/// - 恰好一个变体处于激活态：既不允许两者皆选，也不允许两者皆空。
///   该不变量由 [`select_backend`] 在解析期强制，并由校验引擎复检。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendSelection {
    HostSockets,
    EmbeddedStack,
}

impl BackendSelection {
    /// 返回后端的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HostSockets => "host-sockets",
            Self::EmbeddedStack => "embedded-stack",
        }
    }

    /// 是否为嵌入式协议栈后端。
    #[inline]
    pub const fn is_embedded(self) -> bool {
        matches!(self, Self::EmbeddedStack)
    }
}

impl fmt::Display for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 跨线程投递事件 / 定时器时使用的锁策略。
///
/// ### 设计目的（Why）
/// - 解析器只记录“选择了哪种策略”，并不实现锁本身；锁的落地属于下游事件
///   派发器的运行期职责。
///
/// ### 契约定义（What）
/// - 恰好一个变体处于激活态。
/// - `None` 仅在嵌入方显式接受无同步跨线程投递时合法，这是一项已文档化的
///   风险承诺，不会从后端选择自动推导。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockingPolicy {
    None,
    MutexBased,
    RtosPrimitiveBased,
}

impl LockingPolicy {
    /// 返回锁策略的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MutexBased => "mutex",
            Self::RtosPrimitiveBased => "rtos-primitive",
        }
    }
}

impl fmt::Display for LockingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 依据两个后端开关选出唯一后端。
///
/// ### 逻辑解析（How）
/// 1. 两者皆假 → [`ResolutionErrorKind::BackendNotSelected`]。
/// 2. 两者皆真 → [`ResolutionErrorKind::BackendConflict`]。
/// 3. 其余情形映射到对应变体。
///
/// ### 契约说明（What）
/// - 错误体携带两个后端开关的选项标识，直接指明冲突双方。
/// - 本函数不对后端与锁策略的组合做任何耦合判断：在宿主线程上模拟嵌入式
///   协议栈语义（测试场景）是刻意保留的合法形态，组合兼容性由嵌入方负责。
pub fn select_backend(
    use_embedded_stack: bool,
    use_sockets: bool,
) -> Result<BackendSelection, ResolutionError> {
    match (use_embedded_stack, use_sockets) {
        (false, false) => Err(ResolutionError::with_options(
            ResolutionErrorKind::BackendNotSelected,
            "exactly one network backend must be enabled",
            [keys::USE_EMBEDDED_STACK, keys::USE_SOCKETS],
        )),
        (true, true) => Err(ResolutionError::with_options(
            ResolutionErrorKind::BackendConflict,
            "network backends are mutually exclusive",
            [keys::USE_EMBEDDED_STACK, keys::USE_SOCKETS],
        )),
        (true, false) => Ok(BackendSelection::EmbeddedStack),
        (false, true) => Ok(BackendSelection::HostSockets),
    }
}

/// 依据三个锁策略开关选出唯一策略。
///
/// ### 逻辑解析（How）
/// - 统计处于真值的开关数量：零选报 `LockingNotSelected`，多选报 `LockingConflict`，
///   错误体标注所有处于真值（或全部）的开关键。
pub fn select_locking(
    no_locking: bool,
    mutex_locking: bool,
    rtos_locking: bool,
) -> Result<LockingPolicy, ResolutionError> {
    let enabled = [
        (no_locking, keys::LOCKING_NONE, LockingPolicy::None),
        (mutex_locking, keys::LOCKING_MUTEX, LockingPolicy::MutexBased),
        (
            rtos_locking,
            keys::LOCKING_RTOS_PRIMITIVE,
            LockingPolicy::RtosPrimitiveBased,
        ),
    ];

    let mut selected = None;
    let mut conflicting = alloc::vec::Vec::new();
    for (flag, key, policy) in enabled {
        if flag {
            conflicting.push(key);
            if selected.is_none() {
                selected = Some(policy);
            }
        }
    }

    match (selected, conflicting.len()) {
        (Some(policy), 1) => Ok(policy),
        (None, _) => Err(ResolutionError::with_options(
            ResolutionErrorKind::LockingNotSelected,
            "exactly one locking policy must be enabled",
            [
                keys::LOCKING_NONE,
                keys::LOCKING_MUTEX,
                keys::LOCKING_RTOS_PRIMITIVE,
            ],
        )),
        (Some(_), _) => Err(ResolutionError::with_options(
            ResolutionErrorKind::LockingConflict,
            "locking policies are mutually exclusive",
            conflicting,
        )),
    }
}
