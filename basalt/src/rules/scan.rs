use log::error;

use crate::error::{BasaltResult, OptimizerError};
use crate::operator::LogicalOperator::LogicalOlapScan;
use crate::operator::Operator::{Logical, Physical};
use crate::operator::PhysicalOperator::PhysicalOlapScan as PhysicalScan;
use crate::operator::{OperatorKind, OperatorTrait, PhysicalOlapScan};
use crate::optimizer::OptimizerContext;
use crate::plan::OptExpression;
use crate::rules::{Pattern, Rule, RulePromise, RuleResult, RuleType};

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref OLAP_SCAN_IMPLEMENTATION_PATTERN: Pattern = {
        Pattern::new_leaf(OperatorKind::LogicalOlapScan)
    };
}

/// Olap scan implementation rule.
///
/// Copies the scan and binds the selected index, wrapping the selected partition and tablet in
/// single element lists. Fanning out over several partitions or tablets is left to later
/// planning phases.
#[derive(Clone)]
pub struct OlapScanImplementationRule {}

impl OlapScanImplementationRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl Rule for OlapScanImplementationRule {
    fn apply(
        &self,
        input: &OptExpression,
        _ctx: &mut OptimizerContext,
        result: &mut RuleResult,
    ) -> BasaltResult<()> {
        if let Logical(LogicalOlapScan(scan)) = input.operator() {
            let index_id = match scan.selected_index_id() {
                Some(index_id) => index_id,
                None => {
                    let detail = format!("scan of table {} has no selected index", scan.table());
                    error!("{}", detail);
                    return Err(OptimizerError::InvariantViolation {
                        kind: OperatorKind::LogicalOlapScan,
                        detail,
                    }
                    .into());
                }
            };

            let physical = PhysicalOlapScan::new(
                scan.table().clone(),
                scan.output_column_list().to_vec(),
                scan.column_ref_to_meta().clone(),
                scan.distribution().clone(),
                index_id,
            )
            .with_selected_partition_ids(scan.selected_partition_id().into_iter().collect())
            .with_selected_tablet_ids(scan.selected_tablet_id().into_iter().collect())
            .with_predicate(scan.base().predicate().cloned())
            .with_limit(scan.base().limit());

            result.add(input.clone_with_operator(Physical(PhysicalScan(physical))));
            Ok(())
        } else {
            Err(OptimizerError::PatternMismatch {
                rule: self.rule_type().to_string(),
            }
            .into())
        }
    }

    fn pattern(&self) -> &Pattern {
        &OLAP_SCAN_IMPLEMENTATION_PATTERN
    }

    fn rule_type(&self) -> RuleType {
        RuleType::ImplementOlapScan
    }

    fn rule_promise(&self) -> RulePromise {
        RulePromise::High
    }
}

#[cfg(test)]
mod tests {
    use crate::error::OptimizerError;
    use crate::operator::LogicalOperator;
    use crate::operator::OperatorTrait;
    use crate::plan::OptExpression;
    use crate::rules::{OlapScanImplementationRule, Rule};
    use crate::scalar::ScalarOperator;
    use crate::test_utils::{olap_scan, test_context};

    #[test]
    fn test_implement_olap_scan() {
        let mut ctx = test_context();
        let (scan, columns) = olap_scan(&mut ctx, "t1");
        let scan = scan
            .with_predicate(Some(ScalarOperator::is_null(columns[1].clone().into())))
            .with_limit(Some(100));
        let input = OptExpression::with_operator(LogicalOperator::from(scan.clone()), vec![]);

        let results = OlapScanImplementationRule::new()
            .transform(&input, &mut ctx)
            .unwrap();
        assert_eq!(1, results.len());

        let physical = results[0]
            .operator()
            .as_physical()
            .and_then(|op| op.as_physical_olap_scan())
            .unwrap();
        assert_eq!(scan.output_column_list(), physical.output_column_list());
        assert_eq!(scan.column_ref_to_meta(), physical.column_ref_to_meta());
        assert_eq!(scan.distribution(), physical.distribution());
        assert_eq!(scan.base().predicate(), physical.base().predicate());
        assert_eq!(Some(100), physical.base().limit());
        assert_eq!(scan.selected_index_id(), Some(physical.selected_index_id()));
        assert_eq!(
            vec![scan.selected_partition_id().unwrap()],
            physical.selected_partition_ids()
        );
        assert_eq!(
            vec![scan.selected_tablet_id().unwrap()],
            physical.selected_tablet_ids()
        );
        assert_eq!(0, results[0].arity());
    }

    #[test]
    fn test_missing_selected_index() {
        let mut ctx = test_context();
        let scan = ctx.new_olap_scan("t2").unwrap();
        let input = OptExpression::with_operator(LogicalOperator::from(scan), vec![]);

        let err = OlapScanImplementationRule::new()
            .transform(&input, &mut ctx)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizerError>(),
            Some(OptimizerError::InvariantViolation { .. })
        ));
    }
}
