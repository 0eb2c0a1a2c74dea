//! 配置解析端到端场景验证
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：沿公开 API 走完“覆盖链 → 选择器 → 窗口划分 → 尺寸推导 → 校验”
//!   的完整流水线，覆盖两类标杆场景（套接字默认配置、嵌入式几何推导）与全部
//!   致命错误路径（后端互斥、锁策略互斥、容量覆盖禁令、尺寸下溢）。
//! - **结构说明 (How)**：每个测试构造一条覆盖链并调用 `SystemConfigResolver::resolve`，
//!   对产物字段或错误分类断言；不触碰任何内部模块。
//! - **合同与边界 (What)**：断言只针对稳定公开面（字段值、错误分类、选项标识），
//!   不锁定错误文案，避免措辞调整破坏测试。

use strata_sysconfig::{
    BackendSelection, BufferPoolLimit, ClockSource, EmbeddedStackFacts, LockingPolicy, OptionValue,
    OverrideChain, OverrideLayer, OverrideTier, Provenance, ResolutionErrorKind,
    SystemConfigResolver, keys,
};

fn sockets_chain() -> OverrideChain {
    OverrideChain::new().with_layer(
        OverrideLayer::new(OverrideTier::External)
            .with(keys::USE_SOCKETS, OptionValue::Boolean(true)),
    )
}

fn embedded_chain() -> OverrideChain {
    OverrideChain::new().with_layer(
        OverrideLayer::new(OverrideTier::External)
            .with(keys::USE_EMBEDDED_STACK, OptionValue::Boolean(true)),
    )
}

/// 标杆场景：`backend=sockets`、`locking=mutex`、其余全默认。
#[test]
fn baseline_socket_configuration() {
    let resolved = SystemConfigResolver::new()
        .with_chain(sockets_chain())
        .resolve()
        .expect("baseline resolves");

    assert_eq!(resolved.backend, BackendSelection::HostSockets);
    assert_eq!(resolved.locking, LockingPolicy::MutexBased);
    let range = resolved.error_codes.range();
    assert_eq!((range.base, range.end()), (7000, 8000));
    assert_eq!(resolved.sizing.header_reserve_size, 38);
    assert_eq!(resolved.sizing.payload_capacity_max, 1583);
    assert_eq!(
        resolved.sizing.buffer_pool.slots().map(|n| n.get()),
        Some(15)
    );
    assert_eq!(resolved.sizing.timer_pool_max, 32);
    assert_eq!(resolved.clock, ClockSource::PosixTime);
    assert!(resolved.event_codes.is_none());
    assert!(!resolved.statistics_enabled);
}

/// 嵌入式后端：头部保留量叠加链路 / IP / 传输层开销（38 + 14 + 20 + 20 = 92）。
#[test]
fn embedded_header_reserve_adds_stack_overheads() {
    let facts = EmbeddedStackFacts::new(14, 20, 20, 1664);
    let resolved = SystemConfigResolver::new()
        .with_chain(embedded_chain())
        .with_embedded_facts(facts)
        .resolve()
        .expect("embedded resolves");

    assert_eq!(resolved.sizing.header_reserve_size, 92);
    assert_eq!(resolved.sizing.payload_capacity_max, 1664 - 92);
    assert_eq!(resolved.clock, ClockSource::StackMonotonic);
    let events = resolved.event_codes.expect("dispatcher event space");
    assert_eq!(events.first_unreserved(), 32);
}

#[test]
fn both_backends_enabled_is_a_conflict() {
    let chain = OverrideChain::new().with_layer(
        OverrideLayer::new(OverrideTier::External)
            .with(keys::USE_SOCKETS, OptionValue::Boolean(true))
            .with(keys::USE_EMBEDDED_STACK, OptionValue::Boolean(true)),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::BackendConflict);
    assert!(err.options().contains(&keys::USE_SOCKETS));
    assert!(err.options().contains(&keys::USE_EMBEDDED_STACK));
}

#[test]
fn missing_backend_is_reported_not_defaulted() {
    let err = SystemConfigResolver::new().resolve().unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::BackendNotSelected);
}

#[test]
fn second_locking_policy_conflicts_with_default_mutex() {
    // mutex 默认打开；再打开 rtos-primitive 即多选。
    let chain = sockets_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform)
            .with(keys::LOCKING_RTOS_PRIMITIVE, OptionValue::Boolean(true)),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::LockingConflict);
}

#[test]
fn rtos_locking_requires_disabling_the_default() {
    let chain = embedded_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform)
            .with(keys::LOCKING_MUTEX, OptionValue::Boolean(false))
            .with(keys::LOCKING_RTOS_PRIMITIVE, OptionValue::Boolean(true)),
    );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("rtos locking resolves");
    assert_eq!(resolved.locking, LockingPolicy::RtosPrimitiveBased);
}

/// 模拟配置：嵌入式协议栈语义运行在宿主线程上，embedded + mutex 必须合法。
#[test]
fn embedded_stack_on_host_threads_is_representable() {
    let resolved = SystemConfigResolver::new()
        .with_chain(embedded_chain())
        .resolve()
        .expect("simulation configuration resolves");
    assert_eq!(resolved.backend, BackendSelection::EmbeddedStack);
    assert_eq!(resolved.locking, LockingPolicy::MutexBased);
}

#[test]
fn capacity_override_is_forbidden_on_embedded() {
    let chain = embedded_chain().with_layer(
        OverrideLayer::new(OverrideTier::Project)
            .with(keys::PAYLOAD_CAPACITY_MAX, OptionValue::Integer(2048)),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::CapacityOverrideForbidden);
    assert!(err.options().contains(&keys::PAYLOAD_CAPACITY_MAX));
}

#[test]
fn capacity_override_is_honored_on_sockets() {
    let chain = sockets_chain().with_layer(
        OverrideLayer::new(OverrideTier::Project)
            .with(keys::PAYLOAD_CAPACITY_MAX, OptionValue::Integer(2048)),
    );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("socket override resolves");
    assert_eq!(resolved.sizing.payload_capacity_max, 2048);
    assert_eq!(
        resolved.provenance(&keys::PAYLOAD_CAPACITY_MAX),
        Provenance::ProjectOverride
    );
}

#[test]
fn zero_buffer_pool_signals_unbounded_allocation() {
    let chain = sockets_chain().with_layer(
        OverrideLayer::new(OverrideTier::Layer)
            .with(keys::BUFFER_POOL_MAX, OptionValue::Integer(0)),
    );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("sentinel resolves");
    assert_eq!(resolved.sizing.buffer_pool, BufferPoolLimit::Unbounded);
    assert!(resolved.sizing.buffer_pool.slots().is_none());
}

#[test]
fn degenerate_stack_geometry_underflows() {
    let facts = EmbeddedStackFacts::new(14, 20, 20, 64);
    let err = SystemConfigResolver::new()
        .with_chain(embedded_chain())
        .with_embedded_facts(facts)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::SizingUnderflow);
}

/// 极端的头部保留量覆盖必须以致命错误收场，而不是回绕成微小保留量。
#[test]
fn extreme_header_reserve_override_fails_instead_of_wrapping() {
    let chain = embedded_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform).with(
            keys::HEADER_RESERVE_SIZE,
            OptionValue::Integer(u32::MAX as i64),
        ),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::InvalidOptionValue);
    assert!(err.options().contains(&keys::HEADER_RESERVE_SIZE));
}

#[test]
fn overlapping_error_and_event_windows_are_rejected() {
    let chain = embedded_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform)
            .with(keys::ERROR_RANGE_BASE, OptionValue::Integer(8))
            .with(keys::ERROR_RANGE_WIDTH, OptionValue::Integer(100)),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::NumericRangeOverlap);
}

#[test]
fn non_positive_error_base_touches_reserved_domain() {
    let chain = sockets_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform)
            .with(keys::ERROR_RANGE_BASE, OptionValue::Integer(0)),
    );
    let err = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .unwrap_err();
    assert_eq!(err.kind(), ResolutionErrorKind::NumericRangeOverlap);
}

/// 覆盖链优先序：外部供给 > 系统层覆盖 > 平台覆盖 > 工程覆盖 > 默认值。
#[test]
fn precedence_order_is_total_and_stable() {
    let chain = sockets_chain()
        .with_layer(
            OverrideLayer::new(OverrideTier::Project)
                .with(keys::TIMER_POOL_MAX, OptionValue::Integer(8)),
        )
        .with_layer(
            OverrideLayer::new(OverrideTier::Platform)
                .with(keys::TIMER_POOL_MAX, OptionValue::Integer(16)),
        )
        .with_layer(
            OverrideLayer::new(OverrideTier::Layer)
                .with(keys::TIMER_POOL_MAX, OptionValue::Integer(24)),
        );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("precedence resolves");
    assert_eq!(resolved.sizing.timer_pool_max, 24);
    assert_eq!(
        resolved.provenance(&keys::TIMER_POOL_MAX),
        Provenance::LayerOverride
    );
}

#[test]
fn statistics_toggle_flows_through() {
    let chain = sockets_chain().with_layer(
        OverrideLayer::new(OverrideTier::Project)
            .with(keys::STATISTICS_ENABLED, OptionValue::Boolean(true)),
    );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("statistics resolves");
    assert!(resolved.statistics_enabled);
}

#[test]
fn platform_clock_overrides_backend_derivation() {
    let chain = embedded_chain().with_layer(
        OverrideLayer::new(OverrideTier::Platform)
            .with(keys::PLATFORM_PROVIDES_TIME, OptionValue::Boolean(true)),
    );
    let resolved = SystemConfigResolver::new()
        .with_chain(chain)
        .resolve()
        .expect("platform clock resolves");
    assert_eq!(resolved.clock, ClockSource::PlatformProvided);
}

/// 错误码映射是调用点局部错误，不影响已解析配置的有效性。
#[test]
fn out_of_range_error_code_is_caller_recoverable() {
    let resolved = SystemConfigResolver::new()
        .with_chain(sockets_chain())
        .resolve()
        .expect("baseline resolves");
    assert_eq!(resolved.error_codes.map(0), Ok(7000));
    assert!(resolved.error_codes.map(1_000).is_err());
    // 配置本身保持可用。
    assert_eq!(resolved.error_codes.map(999), Ok(7999));
}
