//! Database operations for test runs and their steps.

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Select, Set, TransactionTrait,
};
use serde_json::json;

use crate::auth::Visibility;
use crate::entity::test_report::{self, ActiveModel, Entity as TestReport};
use crate::entity::{comment, test_step, test_suite};
use crate::error::{AppError, AppResult};
use crate::models::audit_log::{action, resource};
use crate::models::{
    AggregatedReport, EndBound, NewAuditEntry, RunFilter, RunStatus, SortKey, StepStatus,
    SubmitTestResultRequest, TestReportResponse,
};
use crate::services::aggregation;

use super::{DbPool, audit_logs, contains_pattern, suites};

/// Upper bound on bound parameters per `IN (...)` batch.
const ID_BATCH: usize = 500;

/// Runs matching a filter within a visibility scope, unordered.
///
/// `None` means nothing can match (a non-admin with no assigned projects).
fn filtered_runs(filter: &RunFilter, visibility: &Visibility) -> Option<Select<TestReport>> {
    let mut select = TestReport::find();

    if let Visibility::Projects(ids) = visibility {
        if ids.is_empty() {
            return None;
        }
        select = select.filter(test_report::Column::TestProjectId.is_in(ids.iter().copied()));
    }

    if let Some(id) = filter.run_id {
        select = select.filter(test_report::Column::Id.eq(id));
    }
    if let Some(suite_id) = filter.suite_id {
        select = select.filter(test_report::Column::TestSuiteId.eq(suite_id));
    }
    if let Some(project_id) = filter.project_id {
        select = select.filter(test_report::Column::TestProjectId.eq(project_id));
    }
    if let Some(ref name) = filter.test_name {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col((TestReport, test_report::Column::TestName))))
                .like(contains_pattern(name)),
        );
    }
    if let Some(ref status) = filter.status {
        select = select.filter(test_report::Column::Status.eq(status.as_str()));
    }
    if let Some(start) = filter.start {
        select = select.filter(test_report::Column::Timestamp.gte(start));
    }
    match filter.end {
        Some(EndBound::Inclusive(end)) => {
            select = select.filter(test_report::Column::Timestamp.lte(end));
        }
        Some(EndBound::Exclusive(end)) => {
            select = select.filter(test_report::Column::Timestamp.lt(end));
        }
        None => {}
    }
    if let Some(min) = filter.min_execution_time {
        select = select.filter(test_report::Column::ExecutionTime.gte(min));
    }
    if let Some(max) = filter.max_execution_time {
        select = select.filter(test_report::Column::ExecutionTime.lte(max));
    }

    Some(select)
}

fn apply_sort(select: Select<TestReport>, sort: SortKey) -> Select<TestReport> {
    match sort {
        SortKey::Id => select.order_by_asc(test_report::Column::Id),
        SortKey::TestName => select
            .order_by_asc(test_report::Column::TestName)
            .order_by_asc(test_report::Column::Id),
        SortKey::ExecutionTime => select
            .order_by_asc(test_report::Column::ExecutionTime)
            .order_by_asc(test_report::Column::Id),
        SortKey::MostRecent => select
            .order_by_desc(test_report::Column::Timestamp)
            .order_by_desc(test_report::Column::Id),
    }
}

impl DbPool {
    /// Store a run, its steps and, if needed, a new suite in one transaction.
    ///
    /// Project existence and access are checked by the caller.
    pub async fn insert_test_result(&self, req: &SubmitTestResultRequest) -> AppResult<i32> {
        let txn = self.connection().begin().await?;

        let suite_id = match (req.test_suite_id, req.normalized_suite_name()) {
            (Some(id), _) => {
                test_suite::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Test suite {}", id)))?;
                Some(id)
            }
            (None, Some(name)) => {
                Some(suites::resolve_by_name(&txn, &name, req.test_project_id).await?)
            }
            (None, None) => None,
        };

        let run = ActiveModel {
            test_name: Set(req.test_name.trim().to_string()),
            status: Set(req.status.as_str().to_string()),
            execution_time: Set(req.execution_time),
            timestamp: Set(req.timestamp),
            test_suite_id: Set(suite_id),
            test_project_id: Set(req.test_project_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert test report: {}", e)))?;

        if !req.steps.is_empty() {
            let steps = req.steps.iter().map(|s| test_step::ActiveModel {
                test_report_id: Set(run.id),
                step_number: Set(s.step_number),
                step_description: Set(s.step_description.clone()),
                step_status: Set(s.step_status.as_str().to_string()),
                error_message: Set(s.error_message.clone()),
                timestamp: Set(s.timestamp),
                ..Default::default()
            });
            test_step::Entity::insert_many(steps)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert test steps: {}", e)))?;
        }

        txn.commit().await?;

        tracing::info!(
            test_id = run.id,
            test_name = %run.test_name,
            status = %run.status,
            steps = req.steps.len(),
            suite_id = ?suite_id,
            project_id = ?run.test_project_id,
            "Test result stored"
        );

        Ok(run.id)
    }

    /// Get a run by ID.
    pub async fn get_test_report(&self, id: i32) -> AppResult<Option<test_report::Model>> {
        TestReport::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get test report: {}", e)))
    }

    /// Runs matching a filter, in the filter's order, without steps.
    pub async fn list_runs(
        &self,
        filter: &RunFilter,
        visibility: &Visibility,
    ) -> AppResult<Vec<test_report::Model>> {
        let Some(select) = filtered_runs(filter, visibility) else {
            return Ok(Vec::new());
        };

        apply_sort(select, filter.sort)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list test reports: {}", e)))
    }

    /// Totals and pass rate over matching runs, computed in one aggregate query.
    pub async fn aggregate_runs(
        &self,
        filter: &RunFilter,
        visibility: &Visibility,
    ) -> AppResult<AggregatedReport> {
        let Some(select) = filtered_runs(filter, visibility) else {
            return Ok(aggregation::from_totals(0, 0, 0, 0.0));
        };

        let status_count = |status: RunStatus| {
            Expr::expr(
                Expr::case(test_report::Column::Status.eq(status.as_str()), Expr::val(1))
                    .finally(Expr::val(0)),
            )
            .sum()
        };

        let totals = select
            .select_only()
            .column_as(Expr::col((TestReport, test_report::Column::Id)).count(), "total")
            .column_as(status_count(RunStatus::Pass), "passed")
            .column_as(status_count(RunStatus::Fail), "failed")
            .column_as(
                Expr::col((TestReport, test_report::Column::ExecutionTime)).sum(),
                "execution_time",
            )
            .into_tuple::<(i64, Option<i64>, Option<i64>, Option<f64>)>()
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to aggregate test reports: {}", e)))?;

        let (total, passed, failed, execution_time) = totals.unwrap_or_default();
        Ok(aggregation::from_totals(
            Ord::max(total, 0) as u64,
            Ord::max(passed.unwrap_or(0), 0) as u64,
            Ord::max(failed.unwrap_or(0), 0) as u64,
            execution_time.unwrap_or(0.0),
        ))
    }

    /// Steps of the given runs keyed by run ID, each list in insertion order.
    pub async fn steps_for_runs(
        &self,
        run_ids: &[i32],
    ) -> AppResult<HashMap<i32, Vec<test_step::Model>>> {
        let mut by_run: HashMap<i32, Vec<test_step::Model>> = HashMap::new();

        for chunk in run_ids.chunks(ID_BATCH) {
            let steps = test_step::Entity::find()
                .filter(test_step::Column::TestReportId.is_in(chunk.iter().copied()))
                .order_by_asc(test_step::Column::Id)
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to load test steps: {}", e)))?;

            for step in steps {
                by_run.entry(step.test_report_id).or_default().push(step);
            }
        }

        Ok(by_run)
    }

    /// Attach steps and suite names to runs with two batched lookups.
    pub async fn hydrate_runs(
        &self,
        runs: Vec<test_report::Model>,
    ) -> AppResult<Vec<TestReportResponse>> {
        let run_ids: Vec<i32> = runs.iter().map(|r| r.id).collect();
        let mut suite_ids: Vec<i32> = runs.iter().filter_map(|r| r.test_suite_id).collect();
        suite_ids.sort_unstable();
        suite_ids.dedup();

        let mut steps = self.steps_for_runs(&run_ids).await?;
        let suite_names = self.suite_names(&suite_ids).await?;

        Ok(runs
            .into_iter()
            .map(|run| {
                let run_steps = steps.remove(&run.id).unwrap_or_default();
                let suite_name = run
                    .test_suite_id
                    .and_then(|id| suite_names.get(&id).cloned());
                TestReportResponse::from_parts(run, run_steps, suite_name)
            })
            .collect())
    }

    /// Runs matching a filter with their steps and suite names.
    pub async fn list_test_reports(
        &self,
        filter: &RunFilter,
        visibility: &Visibility,
    ) -> AppResult<Vec<TestReportResponse>> {
        let runs = self.list_runs(filter, visibility).await?;
        self.hydrate_runs(runs).await
    }

    /// Error messages of FAIL/ERROR steps under matching runs, in step order.
    pub async fn failure_messages(
        &self,
        filter: &RunFilter,
        visibility: &Visibility,
    ) -> AppResult<Vec<Option<String>>> {
        let Some(runs) = filtered_runs(filter, visibility) else {
            return Ok(Vec::new());
        };
        let run_ids = runs
            .select_only()
            .column(test_report::Column::Id)
            .into_query();

        let failing = [StepStatus::Fail.as_str(), StepStatus::Error.as_str()];
        let steps = test_step::Entity::find()
            .filter(test_step::Column::StepStatus.is_in(failing))
            .filter(test_step::Column::TestReportId.in_subquery(run_ids))
            .order_by_asc(test_step::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load failing steps: {}", e)))?;

        Ok(steps.into_iter().map(|s| s.error_message).collect())
    }

    /// Delete a run with its steps and comments, and record it.
    pub async fn delete_test_report(
        &self,
        actor_id: i32,
        id: i32,
    ) -> AppResult<test_report::Model> {
        let txn = self.connection().begin().await?;

        let existing = TestReport::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test report {}", id)))?;

        test_step::Entity::delete_many()
            .filter(test_step::Column::TestReportId.eq(id))
            .exec(&txn)
            .await?;
        comment::Entity::delete_many()
            .filter(comment::Column::TestReportId.eq(id))
            .exec(&txn)
            .await?;
        TestReport::delete_by_id(id).exec(&txn).await?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::DELETE_REPORT,
                resource_type: resource::REPORT,
                resource_id: Some(id),
                details: Some(json!({"Test Name": existing.test_name})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(existing)
    }
}
