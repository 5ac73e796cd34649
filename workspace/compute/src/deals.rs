//! Role-scoped deal operations.

use common::{
    CreateDealRequest, DealDto, DealListQuery, DealListResponse, Pagination, UpdateDealRequest,
};
use model::entities::{
    deal::{DealStatus, Gender},
    user::Role,
};
use store::{DealChanges, DealFilter, DealSearch, NewDeal, Store};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::convert::deal_dto;
use crate::error::{AccessError, Result};
use crate::identity::Identity;
use crate::policy::{Operation, Resource, Scope, authorize};
use crate::validation::{
    DayBound, FieldErrors, parse_date_bound, parse_enum, parse_money, parse_page_window,
    parse_project, parse_project_filter, parse_uuid,
};

const STATUSES: &str = "new, in_progress, prepayment, partial, completed, cancelled, frozen";

fn parse_status(field: &str, value: &str) -> std::result::Result<DealStatus, common::FieldError> {
    parse_enum(field, value, DealStatus::parse, STATUSES)
}

fn parse_gender(field: &str, value: &str) -> std::result::Result<Gender, common::FieldError> {
    parse_enum(field, value, Gender::parse, "male, female")
}

/// Blank optional text clears the column.
fn optional_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|text| {
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

/// Builds the deal filter for a listing. The caller's ownership constraint
/// goes in first and nothing in the query can widen it.
pub(crate) fn deal_filter(
    scope: Scope,
    query: &DealListQuery,
    errors: &mut FieldErrors,
) -> DealFilter {
    let mut filter = DealFilter {
        manager_id: scope.owner(),
        ..Default::default()
    };

    filter.project = errors
        .check_opt(query.project.as_deref(), |v| parse_project_filter("project", v))
        .flatten();
    filter.statuses = errors
        .check_opt(
            query
                .status
                .as_deref()
                .filter(|v| !v.trim().eq_ignore_ascii_case("all")),
            |v| parse_status("status", v),
        )
        .map(|status| vec![status]);
    filter.created_from = errors.check_opt(query.date_from.as_deref(), |v| {
        parse_date_bound("dateFrom", v, DayBound::Start)
    });
    filter.created_to = errors.check_opt(query.date_to.as_deref(), |v| {
        parse_date_bound("dateTo", v, DayBound::End)
    });

    let term = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let search_by = query.search_by.as_deref().map(str::trim).unwrap_or("client");
    if !matches!(search_by, "client" | "phone" | "manager") {
        errors.push("searchBy", "Must be one of: client, phone, manager");
    } else if let Some(term) = term {
        let term = term.to_string();
        filter.search = Some(match search_by {
            "phone" => DealSearch::Phone(term),
            "manager" => DealSearch::Manager(term),
            _ => DealSearch::Client(term),
        });
    }

    filter
}

/// Checks that `manager_id` names an existing user with the manager role.
pub(crate) async fn ensure_manager(store: &Store, manager_id: Uuid) -> Result<()> {
    match store.get_user(manager_id).await? {
        Some(user) if user.role == Role::Manager => Ok(()),
        _ => Err(AccessError::invalid(
            "managerId",
            "Must reference an existing manager",
        )),
    }
}

/// Lists the deals visible to the caller, one page at a time.
#[instrument(skip(store))]
pub async fn list_deals(
    store: &Store,
    identity: &Identity,
    query: &DealListQuery,
) -> Result<DealListResponse> {
    let scope = authorize(identity, Resource::Deal, Operation::Read)?;

    let mut errors = FieldErrors::validate(query);
    let filter = deal_filter(scope, query, &mut errors);
    let window = parse_page_window(&mut errors, query.page.as_deref(), query.limit.as_deref());
    errors.finish()?;

    debug!(?filter, ?window, "Listing deals");
    let total = store.count_deals(&filter).await?;
    let rows = store.list_deals(&filter, Some(window)).await?;

    Ok(DealListResponse {
        deals: rows.iter().map(deal_dto).collect(),
        pagination: Pagination::new(window.page, window.limit, total),
    })
}

#[instrument(skip(store))]
pub async fn get_deal(store: &Store, identity: &Identity, deal_id: Uuid) -> Result<DealDto> {
    let scope = authorize(identity, Resource::Deal, Operation::Read)?;

    let row = store.get_deal(deal_id).await?;
    if !scope.permits(row.deal.manager_id) {
        warn!(%deal_id, user_id = %identity.user_id, "Deal belongs to another manager");
        return Err(AccessError::Forbidden);
    }

    Ok(deal_dto(&row))
}

/// Creates a deal. Managers always create deals for themselves; admins must
/// name the owning manager.
#[instrument(skip(store, request))]
pub async fn create_deal(
    store: &Store,
    identity: &Identity,
    request: CreateDealRequest,
) -> Result<DealDto> {
    let scope = authorize(identity, Resource::Deal, Operation::Create)?;

    let mut errors = FieldErrors::validate(&request);
    let project = errors.check(parse_project("project", &request.project));
    let status = errors
        .check_opt(request.status.as_deref(), |v| parse_status("status", v))
        .unwrap_or(DealStatus::New);
    let amount = errors.check(parse_money("amount", &request.amount));
    let paid_amount = errors.check_opt(request.paid_amount.as_ref(), |v| {
        parse_money("paidAmount", v)
    });
    let gender = errors.check_opt(request.gender.as_deref(), |v| parse_gender("gender", v));
    let manager_id = match scope {
        Scope::Owner(owner) => Some(owner),
        Scope::All => match request.manager_id.as_deref() {
            Some(raw) => errors.check(parse_uuid("managerId", raw)),
            None => {
                errors.push("managerId", "Owning manager is required");
                None
            }
        },
    };
    if let (Some(amount), Some(paid)) = (amount, paid_amount) {
        if paid > amount {
            errors.push("paidAmount", "Paid amount cannot exceed the deal amount");
        }
    }
    errors.finish()?;

    let (Some(project), Some(amount), Some(manager_id)) = (project, amount, manager_id) else {
        return Err(AccessError::invalid("amount", "Amount is required"));
    };
    if scope == Scope::All {
        ensure_manager(store, manager_id).await?;
    }

    let created = store
        .create_deal(NewDeal {
            client_name: request.client_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            email: optional_text(request.email).flatten(),
            project,
            program: request.program.trim().to_string(),
            manager_id,
            status,
            amount,
            paid_amount,
            source: optional_text(request.source).flatten(),
            marketing_channel: optional_text(request.marketing_channel).flatten(),
            payment_method: optional_text(request.payment_method).flatten(),
            gender,
            client_segment: optional_text(request.client_segment).flatten(),
            comments: optional_text(request.comments).flatten(),
            bank_order_number: optional_text(request.bank_order_number).flatten(),
        })
        .await?;

    info!(deal_id = %created.deal.id, %manager_id, "Deal created");
    Ok(deal_dto(&created))
}

/// Applies a partial update. Supplied amounts are merged with the stored
/// ones and the remaining amount is recomputed by the store.
#[instrument(skip(store, request))]
pub async fn update_deal(
    store: &Store,
    identity: &Identity,
    deal_id: Uuid,
    request: UpdateDealRequest,
) -> Result<DealDto> {
    let scope = authorize(identity, Resource::Deal, Operation::Update)?;

    let mut errors = FieldErrors::validate(&request);
    let project = errors.check_opt(request.project.as_deref(), |v| parse_project("project", v));
    let status = errors.check_opt(request.status.as_deref(), |v| parse_status("status", v));
    let amount = errors.check_opt(request.amount.as_ref(), |v| parse_money("amount", v));
    let paid_amount = errors.check_opt(request.paid_amount.as_ref(), |v| {
        parse_money("paidAmount", v)
    });
    let gender = request.gender.map(|raw| {
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            None
        } else {
            errors.check(parse_gender("gender", &raw))
        }
    });
    let manager_id =
        errors.check_opt(request.manager_id.as_deref(), |v| parse_uuid("managerId", v));
    errors.finish()?;

    let existing = store.get_deal(deal_id).await?;
    if !scope.permits(existing.deal.manager_id) {
        warn!(%deal_id, user_id = %identity.user_id, "Deal belongs to another manager");
        return Err(AccessError::Forbidden);
    }
    if let Some(manager_id) = manager_id {
        match scope {
            Scope::Owner(owner) if owner != manager_id => {
                warn!(%deal_id, %manager_id, "Manager tried to reassign a deal");
                return Err(AccessError::Forbidden);
            }
            Scope::Owner(_) => {}
            Scope::All => ensure_manager(store, manager_id).await?,
        }
    }

    let changes = DealChanges {
        expected_manager: scope.owner(),
        client_name: request.client_name.map(|v| v.trim().to_string()),
        phone: request.phone.map(|v| v.trim().to_string()),
        email: optional_text(request.email),
        project,
        program: request.program.map(|v| v.trim().to_string()),
        manager_id,
        status,
        amount,
        paid_amount,
        source: optional_text(request.source),
        marketing_channel: optional_text(request.marketing_channel),
        payment_method: optional_text(request.payment_method),
        gender,
        client_segment: optional_text(request.client_segment),
        comments: optional_text(request.comments),
        bank_order_number: optional_text(request.bank_order_number),
    };

    let updated = store.update_deal(deal_id, changes).await?;
    info!(%deal_id, "Deal updated");
    Ok(deal_dto(&updated))
}

#[instrument(skip(store))]
pub async fn delete_deal(store: &Store, identity: &Identity, deal_id: Uuid) -> Result<()> {
    authorize(identity, Resource::Deal, Operation::Delete)?;

    store.delete_deal(deal_id).await?;
    info!(%deal_id, "Deal deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        DealSpec, backdate_deal, create_deal as seed_deal, create_user, identity_of,
        init_test_tracing, setup_store,
    };
    use chrono::{TimeZone, Utc};
    use common::MoneyInput;
    use model::entities::deal::Project;
    use rust_decimal::Decimal;

    fn create_request(manager_id: Option<Uuid>, amount: &str, paid: Option<&str>) -> CreateDealRequest {
        CreateDealRequest {
            client_name: "Globex".to_string(),
            phone: "+1 555 0199".to_string(),
            email: Some("buyer@globex.test".to_string()),
            project: "amazon".to_string(),
            program: "Amazon PRO".to_string(),
            manager_id: manager_id.map(|id| id.to_string()),
            status: None,
            amount: MoneyInput::from(amount),
            paid_amount: paid.map(MoneyInput::from),
            source: None,
            marketing_channel: None,
            payment_method: None,
            gender: Some("female".to_string()),
            client_segment: None,
            comments: None,
            bank_order_number: None,
        }
    }

    #[tokio::test]
    async fn test_remaining_amount_is_derived() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;

        let deal = create_deal(
            &store,
            &identity_of(&admin),
            create_request(Some(manager.id), "1000.00", Some("300.00")),
        )
        .await
        .unwrap();
        assert_eq!(deal.amount, "1000.00");
        assert_eq!(deal.paid_amount, "300.00");
        assert_eq!(deal.remaining_amount, "700.00");
        assert_eq!(deal.status, "new");
        assert_eq!(deal.gender.as_deref(), Some("female"));

        let paid_off = update_deal(
            &store,
            &identity_of(&manager),
            deal.id,
            UpdateDealRequest {
                paid_amount: Some(MoneyInput::from("1000")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(paid_off.remaining_amount, "0.00");

        let raised = update_deal(
            &store,
            &identity_of(&admin),
            deal.id,
            UpdateDealRequest {
                amount: Some(MoneyInput::from("1500.50")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(raised.remaining_amount, "500.50");
    }

    #[tokio::test]
    async fn test_blank_email_clears_it() {
        let store = setup_store().await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let me = identity_of(&manager);

        let deal = create_deal(&store, &me, create_request(None, "100", None))
            .await
            .unwrap();
        assert_eq!(deal.email.as_deref(), Some("buyer@globex.test"));

        let cleared = update_deal(
            &store,
            &me,
            deal.id,
            UpdateDealRequest {
                email: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.email, None);

        let rejected = update_deal(
            &store,
            &me,
            deal.id,
            UpdateDealRequest {
                email: Some("not-an-email".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(rejected, Err(AccessError::Validation(ref f)) if f[0].field == "email"));
    }

    #[tokio::test]
    async fn test_manager_deals_are_forced_to_self() {
        let store = setup_store().await;
        let m1 = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let m2 = create_user(&store, "m2", Role::Manager, Some(Project::Amazon)).await;

        let deal = create_deal(
            &store,
            &identity_of(&m1),
            create_request(Some(m2.id), "100", None),
        )
        .await
        .unwrap();
        assert_eq!(deal.manager_id, m1.id);
        assert_eq!(deal.remaining_amount, "100.00");

        let result = update_deal(
            &store,
            &identity_of(&m1),
            deal.id,
            UpdateDealRequest {
                manager_id: Some(m2.id.to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(AccessError::Forbidden)));
    }

    #[tokio::test]
    async fn test_admin_must_name_a_manager() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;

        let missing = create_deal(&store, &identity_of(&admin), create_request(None, "100", None)).await;
        assert!(matches!(missing, Err(AccessError::Validation(ref f)) if f[0].field == "managerId"));

        let not_a_manager = create_deal(
            &store,
            &identity_of(&admin),
            create_request(Some(fin.id), "100", None),
        )
        .await;
        assert!(matches!(not_a_manager, Err(AccessError::Validation(ref f)) if f[0].field == "managerId"));
    }

    #[tokio::test]
    async fn test_invalid_input_lists_every_field() {
        let store = setup_store().await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;

        let mut request = create_request(None, "12.345", Some("-1"));
        request.project = "ebay".to_string();
        request.client_name = String::new();

        match create_deal(&store, &identity_of(&manager), request).await {
            Err(AccessError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["amount", "clientName", "paidAmount", "project"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let overpaid = create_deal(
            &store,
            &identity_of(&manager),
            create_request(None, "100", Some("150")),
        )
        .await;
        assert!(matches!(overpaid, Err(AccessError::Validation(ref f)) if f[0].field == "paidAmount"));
    }

    #[tokio::test]
    async fn test_amounts_and_pages_are_bounded() {
        let store = setup_store().await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let me = identity_of(&manager);

        let huge = create_deal(
            &store,
            &me,
            create_request(None, "50000000000000000000000000000", Some("10000000000")),
        )
        .await;
        match huge {
            Err(AccessError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["amount", "paidAmount"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let largest = create_deal(&store, &me, create_request(None, "9999999999.99", None))
            .await
            .unwrap();
        assert_eq!(largest.amount, "9999999999.99");

        let far_page = list_deals(
            &store,
            &me,
            &DealListQuery {
                page: Some("18446744073709551615".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(far_page, Err(AccessError::Validation(ref f)) if f[0].field == "page"));
    }

    #[tokio::test]
    async fn test_managers_only_see_their_own_deals() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let fin = create_user(&store, "fin", Role::Financist, None).await;
        let m1 = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let m2 = create_user(&store, "m2", Role::Manager, Some(Project::Amazon)).await;

        let first = create_deal(&store, &identity_of(&m1), create_request(None, "100", None))
            .await
            .unwrap();
        create_deal(&store, &identity_of(&m1), create_request(None, "200", None))
            .await
            .unwrap();

        let query = DealListQuery::default();
        let own = list_deals(&store, &identity_of(&m1), &query).await.unwrap();
        assert_eq!(own.pagination.total, 2);

        let other = list_deals(&store, &identity_of(&m2), &query).await.unwrap();
        assert!(other.deals.is_empty());
        assert_eq!(other.pagination.total, 0);
        assert_eq!(other.pagination.pages, 0);

        for viewer in [&admin, &fin] {
            let all = list_deals(&store, &identity_of(viewer), &query).await.unwrap();
            assert_eq!(all.deals.len(), 2);
        }

        assert!(matches!(
            get_deal(&store, &identity_of(&m2), first.id).await,
            Err(AccessError::Forbidden)
        ));
        assert!(matches!(
            get_deal(&store, &identity_of(&m2), Uuid::new_v4()).await,
            Err(AccessError::NotFound(_))
        ));
        assert!(matches!(
            delete_deal(&store, &identity_of(&m1), first.id).await,
            Err(AccessError::Forbidden)
        ));
        assert!(matches!(
            update_deal(&store, &identity_of(&fin), first.id, UpdateDealRequest::default()).await,
            Err(AccessError::Forbidden)
        ));

        delete_deal(&store, &identity_of(&admin), first.id).await.unwrap();
        assert_eq!(
            list_deals(&store, &identity_of(&admin), &query)
                .await
                .unwrap()
                .pagination
                .total,
            1
        );
    }

    #[tokio::test]
    async fn test_list_filters_search_and_paging() {
        let store = setup_store().await;
        let admin = create_user(&store, "admin", Role::Admin, None).await;
        let alice = create_user(&store, "alice", Role::Manager, Some(Project::Amazon)).await;
        let bob = create_user(&store, "bob", Role::Manager, Some(Project::Shopify)).await;

        let old = seed_deal(&store, alice.id, DealSpec::default()).await;
        backdate_deal(&store, old.deal.id, Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()).await;
        seed_deal(
            &store,
            bob.id,
            DealSpec {
                project: Project::Shopify,
                status: DealStatus::Completed,
                ..Default::default()
            },
        )
        .await;
        for _ in 0..3 {
            seed_deal(&store, alice.id, DealSpec::default()).await;
        }

        let admin = identity_of(&admin);
        let shopify = list_deals(
            &store,
            &admin,
            &DealListQuery {
                project: Some("shopify".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(shopify.pagination.total, 1);

        let everything = list_deals(
            &store,
            &admin,
            &DealListQuery {
                project: Some("all".to_string()),
                status: Some("all".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(everything.pagination.total, 5);

        let january = list_deals(
            &store,
            &admin,
            &DealListQuery {
                date_from: Some("2024-01-10".to_string()),
                date_to: Some("2024-01-10".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(january.pagination.total, 1);
        assert_eq!(january.deals[0].id, old.deal.id);

        let by_manager = list_deals(
            &store,
            &admin,
            &DealListQuery {
                search: Some("BOB".to_string()),
                search_by: Some("manager".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_manager.pagination.total, 1);

        let page = list_deals(
            &store,
            &admin,
            &DealListQuery {
                page: Some("2".to_string()),
                limit: Some("2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.deals.len(), 2);
        assert_eq!(page.pagination.pages, 3);
        // Oldest deal sorts last
        let last = list_deals(
            &store,
            &admin,
            &DealListQuery {
                page: Some("3".to_string()),
                limit: Some("2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(last.deals[0].id, old.deal.id);

        let malformed = list_deals(
            &store,
            &admin,
            &DealListQuery {
                status: Some("lost".to_string()),
                date_from: Some("last week".to_string()),
                search_by: Some("email".to_string()),
                limit: Some("0".to_string()),
                ..Default::default()
            },
        )
        .await;
        match malformed {
            Err(AccessError::Validation(fields)) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["dateFrom", "limit", "searchBy", "status"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_payments_keep_remaining_consistent() {
        init_test_tracing();
        let store = setup_store().await;
        let manager = create_user(&store, "m1", Role::Manager, Some(Project::Amazon)).await;
        let identity = identity_of(&manager);
        let deal = seed_deal(&store, manager.id, DealSpec::default()).await;

        let pay = |paid: &'static str| {
            update_deal(
                &store,
                &identity,
                deal.deal.id,
                UpdateDealRequest {
                    paid_amount: Some(MoneyInput::from(paid)),
                    ..Default::default()
                },
            )
        };
        let (a, b) = tokio::join!(pay("250"), pay("400"));
        a.unwrap();
        b.unwrap();

        let stored = get_deal(&store, &identity, deal.deal.id).await.unwrap();
        let paid: Decimal = stored.paid_amount.parse().unwrap();
        let remaining: Decimal = stored.remaining_amount.parse().unwrap();
        assert_eq!(paid + remaining, Decimal::from(1000));
    }
}
