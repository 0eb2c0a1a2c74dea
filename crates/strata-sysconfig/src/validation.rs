use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::resolver::{ResolvedConfiguration, keys};
use crate::selector::BackendSelection;

/// 单条校验结论的状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationState {
    Passed,
    Failed,
}

/// 单条校验结论：检查名、状态与细节说明。
///
/// ### 契约说明（What）
/// - `check`：稳定的检查标识，供 CI 与文档引用。
/// - `detail`：通过时描述被确认的事实，失败时描述冲突细节。
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationFinding {
    pub check: &'static str,
    pub state: ValidationState,
    pub detail: Cow<'static, str>,
}

impl ValidationFinding {
    fn passed(check: &'static str, detail: impl Into<Cow<'static, str>>) -> Self {
        Self {
            check,
            state: ValidationState::Passed,
            detail: detail.into(),
        }
    }

    fn failed(check: &'static str, detail: impl Into<Cow<'static, str>>) -> Self {
        Self {
            check,
            state: ValidationState::Failed,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            ValidationState::Passed => "passed",
            ValidationState::Failed => "FAILED",
        };
        write!(f, "{}: {} ({})", self.check, state, self.detail)
    }
}

/// 一次完整校验的全部结论。
///
/// ### 设计目的（Why）
/// - 校验引擎不满足于“第一条失败即返回”：全部检查都会执行并记录，
///   便于一次构建失败后看到完整的矛盾清单，而不是逐条试错。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    /// 返回全部结论。
    #[inline]
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// 是否全部通过。
    pub fn is_clean(&self) -> bool {
        self.findings
            .iter()
            .all(|finding| finding.state == ValidationState::Passed)
    }

    /// 迭代失败结论。
    pub fn failures(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|finding| finding.state == ValidationState::Failed)
    }
}

/// 对已解析配置复检全部跨组件不变量。
///
/// ### 设计目的（Why）
/// - 解析流水线的各环节在产出时已各自检查过局部不变量；校验引擎在终点
///   对聚合产物再查一遍，保证任何绕过流水线手工构造的配置同样无法携带矛盾
///   进入下游（对应原始系统编译期 `#error` 的“依赖代码运行前即失败”语义）。
///
/// ### 契约说明（What）
/// - 全部检查通过时返回完整的 [`ValidationReport`]。
/// - 任何一条失败即返回对应分类的 [`ResolutionError`]，错误体标注冲突双方的
///   选项标识；绝不降级为警告或以默认值掩盖。
pub fn validate(config: &ResolvedConfiguration) -> Result<ValidationReport, ResolutionError> {
    let mut report = ValidationReport::default();
    let mut first_error = None;

    check_backend_exclusivity(config, &mut report, &mut first_error);
    check_locking_exclusivity(config, &mut report, &mut first_error);
    check_error_range(config, &mut report, &mut first_error);
    check_event_space(config, &mut report, &mut first_error);
    check_sizing(config, &mut report, &mut first_error);
    check_capacity_override(config, &mut report, &mut first_error);

    match first_error {
        Some(error) => Err(error),
        None => Ok(report),
    }
}

fn record(
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
    finding: ValidationFinding,
    error: Option<ResolutionError>,
) {
    report.findings.push(finding);
    if let Some(error) = error {
        first_error.get_or_insert(error);
    }
}

fn check_backend_exclusivity(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let embedded = config
        .option(&keys::USE_EMBEDDED_STACK)
        .and_then(|entry| entry.value.as_bool())
        .unwrap_or(false);
    let sockets = config
        .option(&keys::USE_SOCKETS)
        .and_then(|entry| entry.value.as_bool())
        .unwrap_or(false);

    match crate::selector::select_backend(embedded, sockets) {
        Ok(selected) if selected == config.backend => record(
            report,
            first_error,
            ValidationFinding::passed(
                "backend-exclusivity",
                format!("exactly one backend active: {}", config.backend),
            ),
            None,
        ),
        Ok(selected) => record(
            report,
            first_error,
            ValidationFinding::failed(
                "backend-exclusivity",
                format!(
                    "selected backend {} disagrees with option set ({selected})",
                    config.backend
                ),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::BackendConflict,
                "resolved backend does not match the backend options",
                [keys::USE_EMBEDDED_STACK, keys::USE_SOCKETS],
            )),
        ),
        Err(error) => record(
            report,
            first_error,
            ValidationFinding::failed("backend-exclusivity", format!("{error}")),
            Some(error),
        ),
    }
}

fn check_locking_exclusivity(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let flag = |key: &crate::option::OptionKey| {
        config
            .option(key)
            .and_then(|entry| entry.value.as_bool())
            .unwrap_or(false)
    };

    match crate::selector::select_locking(
        flag(&keys::LOCKING_NONE),
        flag(&keys::LOCKING_MUTEX),
        flag(&keys::LOCKING_RTOS_PRIMITIVE),
    ) {
        Ok(selected) if selected == config.locking => record(
            report,
            first_error,
            ValidationFinding::passed(
                "locking-exclusivity",
                format!("exactly one locking policy active: {}", config.locking),
            ),
            None,
        ),
        Ok(selected) => record(
            report,
            first_error,
            ValidationFinding::failed(
                "locking-exclusivity",
                format!(
                    "selected locking policy {} disagrees with option set ({selected})",
                    config.locking
                ),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::LockingConflict,
                "resolved locking policy does not match the locking options",
                [
                    keys::LOCKING_NONE,
                    keys::LOCKING_MUTEX,
                    keys::LOCKING_RTOS_PRIMITIVE,
                ],
            )),
        ),
        Err(error) => record(
            report,
            first_error,
            ValidationFinding::failed("locking-exclusivity", format!("{error}")),
            Some(error),
        ),
    }
}

fn check_error_range(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let range = config.error_codes.range();
    if range.is_strictly_positive() && range.end() <= i32::MAX as i64 + 1 {
        record(
            report,
            first_error,
            ValidationFinding::passed(
                "error-range-positive",
                format!("error window {range} stays in the strictly positive i32 domain"),
            ),
            None,
        );
    } else {
        record(
            report,
            first_error,
            ValidationFinding::failed(
                "error-range-positive",
                format!("error window {range} touches the reserved non-positive domain"),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::NumericRangeOverlap,
                "error code window must lie strictly above zero and fit i32",
                [keys::ERROR_RANGE_BASE, keys::ERROR_RANGE_WIDTH],
            )),
        );
    }
}

fn check_event_space(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let Some(events) = config.event_codes else {
        record(
            report,
            first_error,
            ValidationFinding::passed(
                "event-space-presence",
                "host-sockets backend has no dispatcher event space",
            ),
            None,
        );
        return;
    };

    if events.first_unreserved() <= 0 {
        record(
            report,
            first_error,
            ValidationFinding::failed(
                "event-space-reserved",
                format!(
                    "first unreserved event code {} leaves no room for built-in events",
                    events.first_unreserved()
                ),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::NumericRangeOverlap,
                "first unreserved event code must be strictly positive",
                [keys::FIRST_UNRESERVED_EVENT_CODE],
            )),
        );
        return;
    }

    let errors = config.error_codes.range();
    let events_reserved = events.reserved_range();
    if errors.is_disjoint(events_reserved) {
        record(
            report,
            first_error,
            ValidationFinding::passed(
                "error-event-disjoint",
                format!("error window {errors} and event window {events_reserved} are disjoint"),
            ),
            None,
        );
    } else {
        record(
            report,
            first_error,
            ValidationFinding::failed(
                "error-event-disjoint",
                format!("error window {errors} intersects event window {events_reserved}"),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::NumericRangeOverlap,
                "error code window intersects the dispatcher event window",
                [keys::ERROR_RANGE_BASE, keys::FIRST_UNRESERVED_EVENT_CODE],
            )),
        );
    }
}

fn check_sizing(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let sizing = &config.sizing;
    let mut violations: Vec<(&'static str, crate::option::OptionKey)> = Vec::new();
    if sizing.header_reserve_size == 0 {
        violations.push(("header reserve", keys::HEADER_RESERVE_SIZE));
    }
    if sizing.payload_capacity_max == 0 {
        violations.push(("payload capacity", keys::PAYLOAD_CAPACITY_MAX));
    }
    if sizing.timer_pool_max == 0 {
        violations.push(("timer pool", keys::TIMER_POOL_MAX));
    }

    if violations.is_empty() {
        record(
            report,
            first_error,
            ValidationFinding::passed(
                "sizing-strictly-positive",
                format!(
                    "header reserve {}, payload capacity {}, timer pool {}",
                    sizing.header_reserve_size, sizing.payload_capacity_max, sizing.timer_pool_max
                ),
            ),
            None,
        );
    } else {
        let (what, key) = violations.swap_remove(0);
        record(
            report,
            first_error,
            ValidationFinding::failed(
                "sizing-strictly-positive",
                format!("{what} resolved to zero"),
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::SizingUnderflow,
                "derived sizing constant must be strictly positive",
                [key],
            )),
        );
    }
}

fn check_capacity_override(
    config: &ResolvedConfiguration,
    report: &mut ValidationReport,
    first_error: &mut Option<ResolutionError>,
) {
    let overridden = config
        .provenance(&keys::PAYLOAD_CAPACITY_MAX)
        .is_overridden();
    if config.backend == BackendSelection::EmbeddedStack && overridden {
        record(
            report,
            first_error,
            ValidationFinding::failed(
                "capacity-override-forbidden",
                "payload capacity was overridden on the embedded-stack backend",
            ),
            Some(ResolutionError::with_options(
                ResolutionErrorKind::CapacityOverrideForbidden,
                "payload capacity on the embedded-stack backend follows the \
                 stack's buffer geometry",
                [keys::PAYLOAD_CAPACITY_MAX, keys::USE_EMBEDDED_STACK],
            )),
        );
    } else {
        record(
            report,
            first_error,
            ValidationFinding::passed(
                "capacity-override-forbidden",
                "payload capacity provenance is consistent with the backend",
            ),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{ErrorCodeSpace, EventCodeSpace, NumericRange};
    use crate::option::OptionValue;
    use crate::overrides::{OverrideChain, OverrideLayer, OverrideTier};
    use crate::resolver::SystemConfigResolver;

    fn resolved_sockets() -> ResolvedConfiguration {
        let chain = OverrideChain::new().with_layer(
            OverrideLayer::new(OverrideTier::External)
                .with(keys::USE_SOCKETS, OptionValue::Boolean(true)),
        );
        SystemConfigResolver::new()
            .with_chain(chain)
            .resolve()
            .expect("valid baseline")
    }

    #[test]
    fn clean_configuration_yields_clean_report() {
        let config = resolved_sockets();
        let report = validate(&config).expect("clean");
        assert!(report.is_clean());
        assert!(report.failures().next().is_none());
    }

    #[test]
    fn hand_built_overlap_is_rejected() {
        // 绕过流水线手工构造矛盾产物：事件窗口覆盖错误窗口。
        let mut config = resolved_sockets();
        config.backend = BackendSelection::EmbeddedStack;
        config.error_codes = ErrorCodeSpace::new(NumericRange::new(10, 100));
        config.event_codes = Some(EventCodeSpace::new(64));
        let err = validate(&config).unwrap_err();
        // 后端与选项集不一致会先被复检捕获。
        assert_eq!(err.kind(), ResolutionErrorKind::BackendConflict);
    }

    #[test]
    fn second_enabled_locking_switch_fails_revalidation() {
        use crate::option::{OptionEntry, Provenance};

        // 绕过流水线，在选项集中再点亮一个锁策略开关。
        let mut config = resolved_sockets();
        config.options.insert(
            keys::LOCKING_RTOS_PRIMITIVE,
            OptionEntry::new(
                keys::LOCKING_RTOS_PRIMITIVE,
                OptionValue::Boolean(true),
                Provenance::PlatformOverride,
            ),
        );
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::LockingConflict);
    }

    #[test]
    fn overlap_alone_reports_range_kind() {
        let mut config = resolved_sockets();
        config.error_codes = ErrorCodeSpace::new(NumericRange::new(-5, 100));
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::NumericRangeOverlap);
    }

    #[test]
    fn zero_timer_pool_is_an_underflow() {
        let mut config = resolved_sockets();
        config.sizing.timer_pool_max = 0;
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::SizingUnderflow);
    }
}
