//! Sales plans: half-month quotas per manager.

use common::{
    CreatePlanRequest, FieldError, PlanDto, PlanListQuery, PlanProgressDto, UpdatePlanRequest,
    format_money,
};
use model::entities::plan::PlanType;
use store::{NewPlan, PlanChanges, PlanFilter, Store};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::analytics::percent;
use crate::analytics::plan_completion::plan_actual;
use crate::convert::plan_dto;
use crate::deals::ensure_manager;
use crate::error::{AccessError, Result};
use crate::identity::Identity;
use crate::policy::{Operation, Resource, Scope, authorize};
use crate::validation::{
    FieldErrors, parse_bool, parse_enum, parse_int_in, parse_money, parse_project,
    parse_project_filter, parse_uuid,
};

fn parse_plan_type(field: &str, value: &str) -> std::result::Result<PlanType, FieldError> {
    parse_enum(field, value, PlanType::parse, "first_half, second_half")
}

/// Builds the plan filter for the caller. `None` means the caller asked for
/// another manager's plans while only allowed to see their own, so nothing
/// can match.
fn plan_filter(scope: Scope, query: &PlanListQuery) -> Result<Option<PlanFilter>> {
    let mut errors = FieldErrors::validate(query);
    let requested =
        errors.check_opt(query.manager_id.as_deref(), |v| parse_uuid("managerId", v));
    let filter = PlanFilter {
        manager_id: requested,
        project: errors
            .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
            .flatten(),
        year: errors.check_opt(query.year.as_deref(), |v| parse_int_in("year", v, 2000, 2100)),
        month: errors.check_opt(query.month.as_deref(), |v| parse_int_in("month", v, 1, 12)),
        plan_type: errors.check_opt(query.plan_type.as_deref(), |v| {
            parse_plan_type("planType", v)
        }),
        is_active: errors.check_opt(query.is_active.as_deref(), |v| parse_bool("isActive", v)),
    };
    errors.finish()?;

    Ok(match (scope, requested) {
        (Scope::Owner(owner), Some(other)) if owner != other => None,
        (Scope::Owner(owner), _) => Some(PlanFilter {
            manager_id: Some(owner),
            ..filter
        }),
        (Scope::All, _) => Some(filter),
    })
}

#[instrument(skip(store))]
pub async fn list_plans(
    store: &Store,
    identity: &Identity,
    query: &PlanListQuery,
) -> Result<Vec<PlanDto>> {
    let scope = authorize(identity, Resource::Plan, Operation::Read)?;
    let Some(filter) = plan_filter(scope, query)? else {
        debug!("Plan filter excludes everything visible to the caller");
        return Ok(Vec::new());
    };

    let rows = store.list_plans(&filter).await?;
    Ok(rows.iter().map(plan_dto).collect())
}

#[instrument(skip(store, request))]
pub async fn create_plan(
    store: &Store,
    identity: &Identity,
    request: CreatePlanRequest,
) -> Result<PlanDto> {
    authorize(identity, Resource::Plan, Operation::Create)?;

    let mut errors = FieldErrors::validate(&request);
    let project = errors.check(parse_project("project", &request.project));
    let manager_id = errors.check(parse_uuid("managerId", &request.manager_id));
    let plan_type = errors.check(parse_plan_type("planType", &request.plan_type));
    let planned_amount = errors.check(parse_money("plannedAmount", &request.planned_amount));
    errors.finish()?;

    let (Some(project), Some(manager_id), Some(plan_type), Some(planned_amount)) =
        (project, manager_id, plan_type, planned_amount)
    else {
        return Err(AccessError::invalid("plannedAmount", "Planned amount is required"));
    };
    ensure_manager(store, manager_id).await?;

    let created = store
        .create_plan(NewPlan {
            project,
            manager_id,
            plan_type,
            year: request.year,
            month: request.month,
            planned_amount,
            planned_deals: request.planned_deals.unwrap_or(0),
            is_active: request.is_active.unwrap_or(true),
        })
        .await?;

    info!(plan_id = %created.plan.id, %manager_id, "Plan created");
    Ok(plan_dto(&created))
}

#[instrument(skip(store, request))]
pub async fn update_plan(
    store: &Store,
    identity: &Identity,
    plan_id: Uuid,
    request: UpdatePlanRequest,
) -> Result<PlanDto> {
    authorize(identity, Resource::Plan, Operation::Update)?;

    let mut errors = FieldErrors::validate(&request);
    let project = errors.check_opt(request.project.as_deref(), |v| parse_project("project", v));
    let manager_id =
        errors.check_opt(request.manager_id.as_deref(), |v| parse_uuid("managerId", v));
    let plan_type =
        errors.check_opt(request.plan_type.as_deref(), |v| parse_plan_type("planType", v));
    let planned_amount = errors.check_opt(request.planned_amount.as_ref(), |v| {
        parse_money("plannedAmount", v)
    });
    errors.finish()?;

    store.get_plan(plan_id).await?;
    if let Some(manager_id) = manager_id {
        ensure_manager(store, manager_id).await?;
    }

    let updated = store
        .update_plan(
            plan_id,
            PlanChanges {
                project,
                manager_id,
                plan_type,
                year: request.year,
                month: request.month,
                planned_amount,
                planned_deals: request.planned_deals,
                is_active: request.is_active,
            },
        )
        .await?;

    info!(%plan_id, "Plan updated");
    Ok(plan_dto(&updated))
}

/// Each visible plan with what its manager actually sold in the plan's
/// half-month window.
#[instrument(skip(store))]
pub async fn plan_progress(
    store: &Store,
    identity: &Identity,
    query: &PlanListQuery,
) -> Result<Vec<PlanProgressDto>> {
    let scope = authorize(identity, Resource::Plan, Operation::Read)?;
    let Some(filter) = plan_filter(scope, query)? else {
        return Ok(Vec::new());
    };

    let rows = store.list_plans(&filter).await?;
    let mut progress = Vec::with_capacity(rows.len());
    for row in &rows {
        let actual = plan_actual(store, &row.plan).await?;
        let Some((period_start, period_end)) = actual.period else {
            continue;
        };
        progress.push(PlanProgressDto {
            plan: plan_dto(row),
            period_start,
            period_end,
            actual_amount: format_money(actual.amount),
            actual_deals: actual.completed_deals,
            completion: percent(actual.amount, store::money::normalize(row.plan.planned_amount)),
        });
    }

    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DealSpec, backdate_deal, create_deal, create_user, identity_of, setup_store};
    use chrono::{TimeZone, Utc};
    use common::MoneyInput;
    use model::entities::{
        deal::{DealStatus, Project},
        user::Role,
    };

    fn request(manager_id: Uuid, plan_type: &str) -> CreatePlanRequest {
        CreatePlanRequest {
            project: "amazon".to_string(),
            manager_id: manager_id.to_string(),
            plan_type: plan_type.to_string(),
            year: 2024,
            month: 2,
            planned_amount: MoneyInput::from("1000"),
            planned_deals: Some(4),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_plan_crud_is_admin_only() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let m1 = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let m2 = create_user(&store, "m2", Role::Manager, Some(Project::Amazon)).await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;
        let admin_id = identity_of(&admin);

        let plan = create_plan(&store, &admin_id, request(m1.id, "first_half"))
            .await
            .unwrap();
        assert!(plan.is_active);
        assert_eq!(plan.planned_amount, "1000.00");
        create_plan(&store, &admin_id, request(m2.id, "second_half"))
            .await
            .unwrap();

        assert!(matches!(
            create_plan(&store, &identity_of(&m1), request(m1.id, "first_half")).await,
            Err(AccessError::Forbidden)
        ));
        assert!(matches!(
            create_plan(&store, &admin_id, request(fin.id, "first_half")).await,
            Err(AccessError::Validation(ref f)) if f[0].field == "managerId"
        ));

        let mut bad = request(m1.id, "third_half");
        bad.month = 13;
        match create_plan(&store, &admin_id, bad).await {
            Err(AccessError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["month", "planType"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let own = list_plans(&store, &identity_of(&m1), &PlanListQuery::default())
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].manager_id, m1.id);

        let peeking = list_plans(
            &store,
            &identity_of(&m1),
            &PlanListQuery {
                manager_id: Some(m2.id.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(peeking.is_empty());

        let all = list_plans(&store, &identity_of(&fin), &PlanListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let updated = update_plan(
            &store,
            &admin_id,
            plan.id,
            UpdatePlanRequest {
                planned_amount: Some(MoneyInput::from("1500.5")),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.planned_amount, "1500.50");
        assert!(!updated.is_active);

        assert!(matches!(
            update_plan(&store, &admin_id, Uuid::new_v4(), UpdatePlanRequest::default()).await,
            Err(AccessError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_progress_counts_only_the_window() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        create_plan(&store, &identity_of(&admin), request(manager.id, "first_half"))
            .await
            .unwrap();

        let inside = create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::Completed,
                amount: "400",
                paid: "400",
                ..Default::default()
            },
        )
        .await;
        backdate_deal(&store, inside.deal.id, Utc.with_ymd_and_hms(2024, 2, 15, 23, 0, 0).unwrap()).await;

        let outside = create_deal(
            &store,
            manager.id,
            DealSpec {
                status: DealStatus::Completed,
                amount: "900",
                paid: "900",
                ..Default::default()
            },
        )
        .await;
        backdate_deal(&store, outside.deal.id, Utc.with_ymd_and_hms(2024, 2, 16, 0, 0, 0).unwrap()).await;

        let other_project = create_deal(
            &store,
            manager.id,
            DealSpec {
                project: Project::Shopify,
                paid: "100",
                ..Default::default()
            },
        )
        .await;
        backdate_deal(&store, other_project.deal.id, Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap()).await;

        let progress = plan_progress(&store, &identity_of(&manager), &PlanListQuery::default())
            .await
            .unwrap();
        assert_eq!(progress.len(), 1);
        let entry = &progress[0];
        assert_eq!(entry.period_start.to_string(), "2024-02-01");
        assert_eq!(entry.period_end.to_string(), "2024-02-15");
        assert_eq!(entry.actual_amount, "400.00");
        assert_eq!(entry.actual_deals, 1);
        assert_eq!(entry.completion, 40);
    }
}
