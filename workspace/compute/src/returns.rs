//! Returns: a separate ledger of money given back against a deal.
//!
//! Registering or completing a return never touches the deal's paid amount.

use chrono::{DateTime, Utc};
use common::{
    CreateReturnRequest, FieldError, Pagination, ReturnDto, ReturnListQuery, ReturnListResponse,
    UpdateReturnRequest,
};
use model::entities::sales_return::ReturnStatus;
use rust_decimal::Decimal;
use store::{NewReturn, ReturnChanges, ReturnFilter, Store, money::normalize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::convert::return_dto;
use crate::error::{AccessError, Result};
use crate::identity::Identity;
use crate::policy::{Operation, Resource, authorize};
use crate::validation::{
    DayBound, FieldErrors, parse_date_bound, parse_enum, parse_money, parse_page_window,
    parse_uuid,
};

fn parse_status(field: &str, value: &str) -> std::result::Result<ReturnStatus, FieldError> {
    parse_enum(
        field,
        value,
        ReturnStatus::parse,
        "requested, processing, completed, rejected",
    )
}

/// A return must be positive and cannot exceed what the client has paid.
fn check_return_amount(amount: Decimal, paid: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AccessError::invalid(
            "returnAmount",
            "Return amount must be greater than zero",
        ));
    }
    if amount > normalize(paid) {
        return Err(AccessError::invalid(
            "returnAmount",
            "Return amount cannot exceed the amount paid on the deal",
        ));
    }
    Ok(())
}

#[instrument(skip(store))]
pub async fn list_returns(
    store: &Store,
    identity: &Identity,
    query: &ReturnListQuery,
) -> Result<ReturnListResponse> {
    let scope = authorize(identity, Resource::Return, Operation::Read)?;

    let mut errors = FieldErrors::validate(query);
    let mut filter = ReturnFilter {
        statuses: errors
            .check_opt(
                query
                    .status
                    .as_deref()
                    .filter(|v| !v.trim().eq_ignore_ascii_case("all")),
                |v| parse_status("status", v),
            )
            .map(|status| vec![status]),
        deal_id: errors.check_opt(query.deal_id.as_deref(), |v| parse_uuid("dealId", v)),
        date_from: errors.check_opt(query.date_from.as_deref(), |v| {
            parse_date_bound("dateFrom", v, DayBound::Start)
        }),
        date_to: errors.check_opt(query.date_to.as_deref(), |v| {
            parse_date_bound("dateTo", v, DayBound::End)
        }),
        ..Default::default()
    };
    filter.deal.manager_id = scope.owner();
    let window = parse_page_window(&mut errors, query.page.as_deref(), query.limit.as_deref());
    errors.finish()?;

    debug!(?filter, ?window, "Listing returns");
    let total = store.count_returns(&filter).await?;
    let rows = store.list_returns(&filter, Some(window)).await?;

    Ok(ReturnListResponse {
        returns: rows.iter().map(return_dto).collect(),
        pagination: Pagination::new(window.page, window.limit, total),
    })
}

/// Registers a return against a deal the caller may see. New returns always
/// start out as `requested`.
#[instrument(skip(store, request))]
pub async fn create_return(
    store: &Store,
    identity: &Identity,
    request: CreateReturnRequest,
    now: DateTime<Utc>,
) -> Result<ReturnDto> {
    let scope = authorize(identity, Resource::Return, Operation::Create)?;

    let mut errors = FieldErrors::validate(&request);
    let deal_id = errors.check(parse_uuid("dealId", &request.deal_id));
    let amount = errors.check(parse_money("returnAmount", &request.return_amount));
    let return_date = errors
        .check_opt(request.return_date.as_deref(), |v| {
            parse_date_bound("returnDate", v, DayBound::Start)
        })
        .unwrap_or(now);
    errors.finish()?;

    let (Some(deal_id), Some(amount)) = (deal_id, amount) else {
        return Err(AccessError::invalid("dealId", "Deal is required"));
    };

    let deal = store.get_deal(deal_id).await?;
    if !scope.permits(deal.deal.manager_id) {
        warn!(%deal_id, user_id = %identity.user_id, "Return against another manager's deal");
        return Err(AccessError::Forbidden);
    }
    check_return_amount(amount, deal.deal.paid_amount)?;

    let created = store
        .create_return(NewReturn {
            deal_id,
            return_date,
            return_amount: amount,
            return_reason: request.return_reason.trim().to_string(),
            status: ReturnStatus::Requested,
            processed_by: None,
        })
        .await?;

    info!(return_id = %created.ret.id, %deal_id, "Return registered");
    Ok(return_dto(&created))
}

/// Processes a return. Completed and rejected returns are final.
#[instrument(skip(store, request))]
pub async fn update_return(
    store: &Store,
    identity: &Identity,
    return_id: Uuid,
    request: UpdateReturnRequest,
) -> Result<ReturnDto> {
    let scope = authorize(identity, Resource::Return, Operation::Update)?;

    let mut errors = FieldErrors::validate(&request);
    let status = errors.check_opt(request.status.as_deref(), |v| parse_status("status", v));
    let amount = errors.check_opt(request.return_amount.as_ref(), |v| {
        parse_money("returnAmount", v)
    });
    let return_date = errors.check_opt(request.return_date.as_deref(), |v| {
        parse_date_bound("returnDate", v, DayBound::Start)
    });
    let processed_by = errors.check_opt(request.processed_by.as_deref(), |v| {
        parse_uuid("processedBy", v)
    });
    errors.finish()?;

    let existing = store.get_return(return_id).await?;
    if !scope.permits(existing.deal.manager_id) {
        warn!(%return_id, user_id = %identity.user_id, "Return belongs to another manager");
        return Err(AccessError::Forbidden);
    }
    if existing.ret.status.is_terminal() {
        warn!(%return_id, status = ?existing.ret.status, "Attempt to change a closed return");
        return Err(AccessError::invalid(
            "status",
            "Completed or rejected returns cannot be changed",
        ));
    }
    if let Some(amount) = amount {
        check_return_amount(amount, existing.deal.paid_amount)?;
    }

    let processed_by = match processed_by {
        Some(user_id) => {
            if store.get_user(user_id).await?.is_none() {
                return Err(AccessError::invalid(
                    "processedBy",
                    "Must reference an existing user",
                ));
            }
            Some(Some(user_id))
        }
        None if status.is_some_and(|s| s != existing.ret.status) => Some(Some(identity.user_id)),
        None => None,
    };

    let updated = store
        .update_return(
            return_id,
            ReturnChanges {
                return_date,
                return_amount: amount,
                return_reason: request.return_reason.map(|r| r.trim().to_string()),
                status,
                processed_by,
            },
        )
        .await?;

    info!(%return_id, status = ?updated.ret.status, "Return updated");
    Ok(return_dto(&updated))
}
