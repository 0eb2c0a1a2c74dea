use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::namespace::{ErrorCodeSpace, EventCodeSpace, NumericRange};
use crate::option::{OptionEntry, OptionKey, OptionValue, Provenance};
use crate::overrides::OverrideChain;
use crate::selector::{self, BackendSelection, LockingPolicy};
use crate::sizing::{
    self, BufferPoolLimit, DEFAULT_BUFFER_POOL_MAX, DEFAULT_PAYLOAD_CAPACITY_MAX,
    DEFAULT_TIMER_POOL_MAX, EmbeddedStackFacts, SizingPlan, overhead,
};
use crate::validation;

/// 解析器识别的全部选项键。
///
/// 按关注点分域：`backend` / `locking` / `codes` / `sizing` / `observability` / `time`。
/// 覆盖链中出现的未知键会原样保留在产物里，但不参与任何决策。
pub mod keys {
    use crate::option::OptionKey;

    /// 启用宿主套接字后端。
    pub const USE_SOCKETS: OptionKey = OptionKey::from_static("backend", "use-sockets");
    /// 启用嵌入式协议栈后端。
    pub const USE_EMBEDDED_STACK: OptionKey =
        OptionKey::from_static("backend", "use-embedded-stack");

    /// 禁用跨线程锁（嵌入方显式承诺无同步投递时方可启用）。
    pub const LOCKING_NONE: OptionKey = OptionKey::from_static("locking", "none");
    /// 基于互斥量的锁策略（默认）。
    pub const LOCKING_MUTEX: OptionKey = OptionKey::from_static("locking", "mutex");
    /// 基于 RTOS 原语的锁策略。
    pub const LOCKING_RTOS_PRIMITIVE: OptionKey =
        OptionKey::from_static("locking", "rtos-primitive");

    /// 错误码窗口基址。
    pub const ERROR_RANGE_BASE: OptionKey = OptionKey::from_static("codes", "error-range-base");
    /// 错误码窗口宽度。
    pub const ERROR_RANGE_WIDTH: OptionKey = OptionKey::from_static("codes", "error-range-width");
    /// 首个未保留事件码（仅嵌入式后端生效）。
    pub const FIRST_UNRESERVED_EVENT_CODE: OptionKey =
        OptionKey::from_static("codes", "first-unreserved-event-code");

    /// 基础头部保留字节数。
    pub const HEADER_RESERVE_SIZE: OptionKey =
        OptionKey::from_static("sizing", "header-reserve-size");
    /// 最大载荷容量（仅套接字后端允许覆盖）。
    pub const PAYLOAD_CAPACITY_MAX: OptionKey =
        OptionKey::from_static("sizing", "payload-capacity-max");
    /// 缓冲池容量上限（0 = 无界 / 动态分配）。
    pub const BUFFER_POOL_MAX: OptionKey = OptionKey::from_static("sizing", "buffer-pool-max");
    /// 定时器池槽位数。
    pub const TIMER_POOL_MAX: OptionKey = OptionKey::from_static("sizing", "timer-pool-max");

    /// 是否启用统计采集协作方。
    pub const STATISTICS_ENABLED: OptionKey =
        OptionKey::from_static("observability", "statistics-enabled");

    /// 平台自带时钟提供者。
    pub const PLATFORM_PROVIDES_TIME: OptionKey =
        OptionKey::from_static("time", "platform-provides-time");
    /// 实时时钟可信的最早 Unix 秒（默认 2000-01-01 00:00:00）。
    pub const VALID_REAL_TIME_THRESHOLD: OptionKey =
        OptionKey::from_static("time", "valid-real-time-threshold");
}

/// 内建默认值表。
///
/// 后端开关默认均为假：后端属于“必须显式供给”的选项，缺省即在选择器处
/// 报 `BackendNotSelected`，绝不代为挑选。
pub fn defaults() -> Vec<(OptionKey, OptionValue)> {
    alloc::vec![
        (keys::USE_SOCKETS, OptionValue::Boolean(false)),
        (keys::USE_EMBEDDED_STACK, OptionValue::Boolean(false)),
        (keys::LOCKING_NONE, OptionValue::Boolean(false)),
        (keys::LOCKING_MUTEX, OptionValue::Boolean(true)),
        (keys::LOCKING_RTOS_PRIMITIVE, OptionValue::Boolean(false)),
        (
            keys::ERROR_RANGE_BASE,
            OptionValue::Integer(ErrorCodeSpace::DEFAULT_BASE as i64),
        ),
        (
            keys::ERROR_RANGE_WIDTH,
            OptionValue::Integer(ErrorCodeSpace::DEFAULT_WIDTH as i64),
        ),
        (
            keys::FIRST_UNRESERVED_EVENT_CODE,
            OptionValue::Integer(EventCodeSpace::DEFAULT_FIRST_UNRESERVED as i64),
        ),
        (
            keys::HEADER_RESERVE_SIZE,
            OptionValue::Integer(overhead::BASE_HEADER_RESERVE as i64),
        ),
        (
            keys::PAYLOAD_CAPACITY_MAX,
            OptionValue::Integer(DEFAULT_PAYLOAD_CAPACITY_MAX as i64),
        ),
        (
            keys::BUFFER_POOL_MAX,
            OptionValue::Integer(DEFAULT_BUFFER_POOL_MAX as i64),
        ),
        (
            keys::TIMER_POOL_MAX,
            OptionValue::Integer(DEFAULT_TIMER_POOL_MAX as i64),
        ),
        (keys::STATISTICS_ENABLED, OptionValue::Boolean(false)),
        (keys::PLATFORM_PROVIDES_TIME, OptionValue::Boolean(false)),
        (
            keys::VALID_REAL_TIME_THRESHOLD,
            OptionValue::Integer(946_684_800),
        ),
    ]
}

/// 系统层时钟函数的提供来源。
///
/// ### 逻辑说明（How）
/// - 平台显式声明自带时钟时优先；否则按后端推导：套接字 → POSIX 时间函数，
///   嵌入式协议栈 → 协议栈单调时钟。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockSource {
    PosixTime,
    StackMonotonic,
    PlatformProvided,
}

impl ClockSource {
    /// 返回时钟来源的稳定字符串描述。
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PosixTime => "posix-time",
            Self::StackMonotonic => "stack-monotonic",
            Self::PlatformProvided => "platform-provided",
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次构建的全部决策产物。
///
/// ### 设计目的（Why）
/// - 原始系统把这些决策散落在进程级宏状态里；此处重构为显式的、一次构造的
///   不可变值，由启动流程穿线传递给每个消费者，杜绝可变全局状态。
///
/// ### 契约定义（What）
/// - 每次构建恰好构造一次，此后只读；相同输入必然得到逐位相同的产物。
/// - `options`：每个已知键的生效值与来源记录，供审计与校验引擎复检使用。
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfiguration {
    pub backend: BackendSelection,
    pub locking: LockingPolicy,
    pub error_codes: ErrorCodeSpace,
    /// 仅嵌入式后端存在派发器事件空间。
    pub event_codes: Option<EventCodeSpace>,
    pub sizing: SizingPlan,
    pub clock: ClockSource,
    pub statistics_enabled: bool,
    pub valid_real_time_threshold: i64,
    pub options: BTreeMap<OptionKey, OptionEntry>,
}

impl ResolvedConfiguration {
    /// 查询某个选项的生效记录。
    #[inline]
    pub fn option(&self, key: &OptionKey) -> Option<&OptionEntry> {
        self.options.get(key)
    }

    /// 查询某个选项的来源；未知键视为未覆盖。
    pub fn provenance(&self, key: &OptionKey) -> Provenance {
        self.options
            .get(key)
            .map(|entry| entry.provenance)
            .unwrap_or(Provenance::Default)
    }
}

/// 单趟、无副作用的配置解析引擎。
///
/// ### 设计目的（Why）
/// - 把覆盖链产出的选项集坍缩为一份 [`ResolvedConfiguration`]：后端与锁策略
///   选择、码值窗口划分、尺寸推导依次完成，最后整体交给校验引擎复检。
///
/// ### 执行流程（How）
/// 1. `OverrideChain::resolve` 以内建默认值为底座合并出选项集。
/// 2. [`selector`] 强制后端 / 锁策略的互斥不变量。
/// 3. 构造错误码 / 事件码窗口并检查窗口表示的合法性。
/// 4. [`sizing`] 由后端与开销事实推导头部保留量、载荷容量与池容量。
/// 5. [`validation::validate`] 对全部跨组件不变量复检后放行。
///
/// ### 契约说明（What）
/// - 解析要么整体成功，要么带着首个致命错误整体失败；没有部分产物。
/// - 解析过程不阻塞、不挂起、无共享可变状态，多次运行彼此独立。
#[derive(Clone, Debug, Default)]
pub struct SystemConfigResolver {
    chain: OverrideChain,
    embedded_facts: EmbeddedStackFacts,
}

impl SystemConfigResolver {
    /// 构造空解析器（无覆盖层、默认几何事实）。
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定覆盖链。
    pub fn with_chain(mut self, chain: OverrideChain) -> Self {
        self.chain = chain;
        self
    }

    /// 注入嵌入式协议栈的几何事实；仅嵌入式后端会读取。
    pub fn with_embedded_facts(mut self, facts: EmbeddedStackFacts) -> Self {
        self.embedded_facts = facts;
        self
    }

    /// 执行解析，返回校验通过的配置产物。
    pub fn resolve(self) -> Result<ResolvedConfiguration, ResolutionError> {
        let options = self.chain.resolve(&defaults());

        let backend = selector::select_backend(
            bool_option(&options, &keys::USE_EMBEDDED_STACK)?,
            bool_option(&options, &keys::USE_SOCKETS)?,
        )?;
        let locking = selector::select_locking(
            bool_option(&options, &keys::LOCKING_NONE)?,
            bool_option(&options, &keys::LOCKING_MUTEX)?,
            bool_option(&options, &keys::LOCKING_RTOS_PRIMITIVE)?,
        )?;

        let error_base = i32_option(&options, &keys::ERROR_RANGE_BASE)?;
        let error_width = i32_option(&options, &keys::ERROR_RANGE_WIDTH)?;
        let error_codes = ErrorCodeSpace::new(NumericRange::new(error_base, error_width));

        let event_codes = if backend.is_embedded() {
            let first = i32_option(&options, &keys::FIRST_UNRESERVED_EVENT_CODE)?;
            Some(EventCodeSpace::new(first))
        } else {
            None
        };

        let base_reserve = u32_option(&options, &keys::HEADER_RESERVE_SIZE)?;
        let header_reserve =
            sizing::derive_header_reserve(backend, base_reserve, &self.embedded_facts)?;

        // 嵌入式后端禁止独立覆盖载荷上限：上限必须跟随协议栈缓冲几何。
        let capacity_entry = require_entry(&options, &keys::PAYLOAD_CAPACITY_MAX)?;
        if backend.is_embedded() && capacity_entry.provenance.is_overridden() {
            return Err(ResolutionError::with_options(
                ResolutionErrorKind::CapacityOverrideForbidden,
                "payload capacity on the embedded-stack backend is derived from \
                 the stack's buffer geometry and must not be overridden",
                [keys::PAYLOAD_CAPACITY_MAX, keys::USE_EMBEDDED_STACK],
            ));
        }
        let explicit_capacity = u32_option(&options, &keys::PAYLOAD_CAPACITY_MAX)?;
        let payload_capacity = sizing::derive_payload_capacity(
            backend,
            explicit_capacity,
            header_reserve,
            &self.embedded_facts,
        )?;

        let buffer_pool =
            BufferPoolLimit::from_raw(i64_option(&options, &keys::BUFFER_POOL_MAX)?)?;
        let timer_pool_max = u32_option(&options, &keys::TIMER_POOL_MAX)?;

        let platform_time = bool_option(&options, &keys::PLATFORM_PROVIDES_TIME)?;
        let clock = if platform_time {
            ClockSource::PlatformProvided
        } else if backend.is_embedded() {
            ClockSource::StackMonotonic
        } else {
            ClockSource::PosixTime
        };

        let resolved = ResolvedConfiguration {
            backend,
            locking,
            error_codes,
            event_codes,
            sizing: SizingPlan {
                header_reserve_size: header_reserve,
                payload_capacity_max: payload_capacity,
                buffer_pool,
                timer_pool_max,
            },
            clock,
            statistics_enabled: bool_option(&options, &keys::STATISTICS_ENABLED)?,
            valid_real_time_threshold: i64_option(&options, &keys::VALID_REAL_TIME_THRESHOLD)?,
            options,
        };

        validation::validate(&resolved)?;
        Ok(resolved)
    }
}

fn require_entry<'a>(
    options: &'a BTreeMap<OptionKey, OptionEntry>,
    key: &OptionKey,
) -> Result<&'a OptionEntry, ResolutionError> {
    options.get(key).ok_or_else(|| {
        ResolutionError::with_options(
            ResolutionErrorKind::InvalidOptionValue,
            "recognized option is missing from the resolved set",
            [key.clone()],
        )
    })
}

fn bool_option(
    options: &BTreeMap<OptionKey, OptionEntry>,
    key: &OptionKey,
) -> Result<bool, ResolutionError> {
    let entry = require_entry(options, key)?;
    entry.value.as_bool().ok_or_else(|| type_mismatch(entry, "boolean"))
}

fn i64_option(
    options: &BTreeMap<OptionKey, OptionEntry>,
    key: &OptionKey,
) -> Result<i64, ResolutionError> {
    let entry = require_entry(options, key)?;
    entry.value.as_i64().ok_or_else(|| type_mismatch(entry, "integer"))
}

fn i32_option(
    options: &BTreeMap<OptionKey, OptionEntry>,
    key: &OptionKey,
) -> Result<i32, ResolutionError> {
    let raw = i64_option(options, key)?;
    i32::try_from(raw).map_err(|_| {
        ResolutionError::with_options(
            ResolutionErrorKind::InvalidOptionValue,
            "value does not fit the 32-bit code representation",
            [key.clone()],
        )
    })
}

fn u32_option(
    options: &BTreeMap<OptionKey, OptionEntry>,
    key: &OptionKey,
) -> Result<u32, ResolutionError> {
    let raw = i64_option(options, key)?;
    u32::try_from(raw).map_err(|_| {
        ResolutionError::with_options(
            ResolutionErrorKind::InvalidOptionValue,
            "value must be a non-negative 32-bit quantity",
            [key.clone()],
        )
    })
}

fn type_mismatch(entry: &OptionEntry, expected: &'static str) -> ResolutionError {
    ResolutionError::with_options(
        ResolutionErrorKind::InvalidOptionValue,
        alloc::format!(
            "expected a {expected} value, found {}",
            entry.value.type_name()
        ),
        [entry.key.clone()],
    )
}
