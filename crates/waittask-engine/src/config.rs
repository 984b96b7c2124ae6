//! Pre-flight validation of a `WaitConfig`, per spec §4.6.
//!
//! Validation runs once, before `OrchestratorStarted` is ever journaled —
//! a config that fails here never starts waiting at all.
//! [`crate::orchestrator::WaitOrchestrator::start`] is what actually wires
//! this into the `Failed` journal entry and `on_error` routing described by
//! spec §4.4; `validate` itself only reports success or a [`WaitTaskError`].

use waittask_types::{ErrorKind, WaitConfig, WaitTaskError};

use crate::evaluator::{CompiledPredicate, Evaluator};

/// A `WaitConfig` that has passed validation, holding its pre-compiled
/// predicate so the signal-processing activity never re-parses `condition`
/// on every delivery.
pub struct CompiledWaitConfig {
    config: WaitConfig,
    predicate: CompiledPredicate,
}

impl CompiledWaitConfig {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn wait_for(&self) -> &str {
        &self.config.wait_for
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.config.timeout
    }

    pub fn predicate(&self) -> &CompiledPredicate {
        &self.predicate
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }
}

/// Validate `config`, compiling its `condition` against `evaluator`.
///
/// Checks, in order: `wait_for` non-empty, `condition` non-empty and
/// compiles, `timeout` non-zero, and (if present) `processor.id`/`processor.type`
/// non-empty. The first failure wins — there is no need to report every
/// defect in a config the host will simply reject and fix.
pub fn validate(
    config: &WaitConfig,
    evaluator: &Evaluator,
) -> Result<CompiledWaitConfig, WaitTaskError> {
    if config.wait_for.trim().is_empty() {
        return Err(WaitTaskError::new(
            ErrorKind::InvalidConfig,
            "wait_for must not be empty",
        ));
    }

    if config.condition.trim().is_empty() {
        return Err(WaitTaskError::new(
            ErrorKind::InvalidConfig,
            "condition must not be empty",
        ));
    }

    let predicate = evaluator.compile(&config.condition).map_err(|e| {
        e.with_detail(format!("wait-task '{}' condition", config.id))
    })?;

    if config.timeout.is_zero() {
        return Err(WaitTaskError::new(
            ErrorKind::InvalidConfig,
            "timeout must be greater than zero",
        ));
    }

    if let Some(processor) = &config.processor {
        if processor.id.trim().is_empty() {
            return Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                "processor.id must not be empty when processor is declared",
            ));
        }
        if processor.kind.trim().is_empty() {
            return Err(WaitTaskError::new(
                ErrorKind::InvalidConfig,
                "processor.type must not be empty when processor is declared",
            ));
        }
    }

    Ok(CompiledWaitConfig {
        config: config.clone(),
        predicate,
    })
}

#[cfg(test)]
mod tests {
    use waittask_types::ContinuationSpec;

    use super::*;

    fn base_config() -> WaitConfig {
        WaitConfig {
            id: "wait-1".into(),
            wait_for: "approval".into(),
            condition: "signal.payload.status == 'approved'".into(),
            timeout: std::time::Duration::from_secs(60),
            processor: None,
            on_success: ContinuationSpec {
                next: "next_task".into(),
            },
            on_error: ContinuationSpec {
                next: "error_task".into(),
            },
            on_timeout: None,
        }
    }

    #[test]
    fn accepts_well_formed_config() {
        let evaluator = Evaluator::default();
        assert!(validate(&base_config(), &evaluator).is_ok());
    }

    #[test]
    fn rejects_empty_wait_for() {
        let evaluator = Evaluator::default();
        let mut config = base_config();
        config.wait_for = String::new();
        let err = validate(&config, &evaluator).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn rejects_uncompilable_condition() {
        let evaluator = Evaluator::default();
        let mut config = base_config();
        config.condition = "signal.payload.status ==".into();
        assert!(validate(&config, &evaluator).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let evaluator = Evaluator::default();
        let mut config = base_config();
        config.timeout = std::time::Duration::ZERO;
        assert!(validate(&config, &evaluator).is_err());
    }

    #[test]
    fn rejects_processor_with_empty_type() {
        let evaluator = Evaluator::default();
        let mut config = base_config();
        config.processor = Some(waittask_types::ProcessorSpec {
            id: "proc-1".into(),
            kind: String::new(),
            use_: None,
            with: None,
        });
        assert!(validate(&config, &evaluator).is_err());
    }

    #[test]
    fn rejected_config_error_matches_its_snapshot() {
        let evaluator = Evaluator::default();
        let mut config = base_config();
        config.timeout = std::time::Duration::ZERO;
        let err = validate(&config, &evaluator).unwrap_err();
        insta::assert_debug_snapshot!(err.kind, @"InvalidConfig");
    }

    #[test]
    fn compiling_the_same_config_twice_yields_equal_predicates() {
        let evaluator = Evaluator::default();
        let a = validate(&base_config(), &evaluator).unwrap();
        let b = validate(&base_config(), &evaluator).unwrap();
        similar_asserts::assert_eq!(a.config(), b.config());
    }
}
