#![cfg_attr(not(feature = "std"), no_std)]
#![doc = "strata-sysconfig: 可移植系统层（System Layer）的构建期配置解析与校验引擎。"]
#![doc = ""]
#![doc = "== 问题域 =="]
#![doc = "同一套系统层代码需要在两类根本不同的目标上原样运行：使用阻塞套接字与抢占式线程的"]
#![doc = "通用宿主，以及运行在实时调度器之上的单线程事件驱动嵌入式网络栈。本 crate 负责在"]
#![doc = "构建阶段把一组相互依赖、常常互斥的配置选项坍缩为一份内部一致的运行策略："]
#![doc = "选项矛盾时在解析阶段立即失败，而不是让不一致的配置进入下游代码。"]
#![doc = ""]
#![doc = "== 组成 =="]
#![doc = "1. `overrides`：覆盖链，按固定优先序合并四类覆盖输入与内建默认值。"]
#![doc = "2. `selector`：后端与锁策略选择器，强制互斥不变量。"]
#![doc = "3. `namespace`：错误码 / 事件码的数值窗口划分。"]
#![doc = "4. `sizing`：由协议头开销事实推导缓冲 / 定时器常量。"]
#![doc = "5. `validation`：解析完成后对全部跨组件不变量复检。"]

extern crate alloc;

pub mod error;
pub mod namespace;
pub mod option;
pub mod overrides;
pub mod resolver;
pub mod selector;
pub mod sizing;
pub mod snapshot;
pub mod validation;

pub use error::{CodeMapError, ResolutionError, ResolutionErrorKind};
pub use namespace::{
    ErrorCodeSpace, EventCodeMapper, EventCodeSpace, IdentityEventMapper, NumericRange,
};
pub use option::{OptionEntry, OptionKey, OptionValue, Provenance};
pub use overrides::{OverrideChain, OverrideLayer, OverrideTier};
pub use resolver::{ClockSource, ResolvedConfiguration, SystemConfigResolver, keys};
pub use selector::{BackendSelection, LockingPolicy};
pub use sizing::{BufferPoolLimit, EmbeddedStackFacts, SizingPlan};
pub use snapshot::{ConfigSnapshot, SnapshotEntry, SnapshotValue};
pub use validation::{ValidationFinding, ValidationReport, ValidationState, validate};

use core::fmt;

/// 本 crate 中所有错误必须实现的 `no_std` 基础 Trait。
///
/// # 设计背景（Why）
/// - `std::error::Error` 在 `no_std` 环境中不可用，而嵌入式协议栈目标正是 `no_std`；
///   因此需要一个对象安全、与平台无关的错误抽象来串联错误链。
/// - 该 Trait 是所有错误类型的“最小公共接口”，保证在 `alloc` 场景下完成跨模块错误传递。
///
/// # 逻辑解析（How）
/// - 约束实现者提供 `Debug` 与 `Display`，便于日志与诊断输出。
/// - `source` 方法递归返回链路上的上游错误，与 `std::error::Error::source` 语义一致。
///
/// # 契约说明（What）
/// - **前置条件**：实现类型须为 `'static` 生命周期。
/// - **后置条件**：`source` 返回的引用生命周期受限于 `self`，以防悬垂引用。
pub trait Error: fmt::Debug + fmt::Display {
    /// 返回当前错误的上游来源。
    fn source(&self) -> Option<&(dyn Error + 'static)>;
}

impl<E> Error for alloc::boxed::Box<E>
where
    E: Error + ?Sized,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        (**self).source()
    }
}
