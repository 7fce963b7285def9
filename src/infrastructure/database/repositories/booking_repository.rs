//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::common::{db_err, is_unique_violation};
use crate::domain::booking::{vehicle_already_active, BookingRepository, StatusChange};
use crate::domain::{Booking, BookingKind, BookingStatus, DomainError, DomainResult};
use crate::infrastructure::database::entities::booking;

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_many(&self, condition: Condition) -> DomainResult<Vec<Booking>> {
        booking::Entity::find()
            .filter(condition)
            .order_by_asc(booking::Column::CreatedAt)
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }
}

fn open_statuses() -> Condition {
    Condition::all().add(
        booking::Column::Status.is_in(BookingStatus::OPEN.iter().map(|s| s.as_str())),
    )
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = BookingStatus::from_str(&m.status).ok_or_else(|| {
        DomainError::Upstream(format!("booking {} has unknown status '{}'", m.id, m.status))
    })?;
    let kind = BookingKind::from_str(&m.booking_type).ok_or_else(|| {
        DomainError::Upstream(format!(
            "booking {} has unknown type '{}'",
            m.id, m.booking_type
        ))
    })?;
    Ok(Booking {
        id: m.id,
        vehicle_id: m.vehicle_id,
        user_id: m.user_id,
        location_id: m.location_id,
        start_time: m.start_time,
        end_time: m.end_time,
        status,
        spot_number: m.spot_number,
        total_amount: m.total_amount,
        kind,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn insert(&self, b: Booking) -> DomainResult<()> {
        debug!("Inserting booking: {} ({})", b.id, b.kind.as_str());

        let model = booking::ActiveModel {
            id: Set(b.id),
            vehicle_id: Set(b.vehicle_id),
            user_id: Set(b.user_id),
            location_id: Set(b.location_id),
            start_time: Set(b.start_time),
            end_time: Set(b.end_time),
            status: Set(b.status.as_str().to_string()),
            spot_number: Set(b.spot_number),
            total_amount: Set(b.total_amount),
            booking_type: Set(b.kind.as_str().to_string()),
            created_at: Set(b.created_at),
            updated_at: Set(b.updated_at),
        };
        match model.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) && b.status == BookingStatus::Active => {
                Err(vehicle_already_active(b.vehicle_id))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        self.find_many(Condition::all().add(booking::Column::VehicleId.eq(vehicle_id)))
            .await
    }

    async fn find_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> DomainResult<Vec<Booking>> {
        self.find_many(
            open_statuses().add(booking::Column::VehicleId.eq(vehicle_id)),
        )
        .await
    }

    async fn find_reservation_at(
        &self,
        vehicle_id: Uuid,
        location_id: Uuid,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Booking>> {
        let condition = Condition::all()
            .add(booking::Column::VehicleId.eq(vehicle_id))
            .add(booking::Column::LocationId.eq(location_id))
            .add(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
            .add(booking::Column::BookingType.eq(BookingKind::PreBooked.as_str()))
            .add(booking::Column::StartTime.lte(at))
            .add(
                Condition::any()
                    .add(booking::Column::EndTime.is_null())
                    .add(booking::Column::EndTime.gte(at)),
            );
        Ok(self.find_many(condition).await?.into_iter().next())
    }

    async fn find_range_conflicts(
        &self,
        spot_number: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        // NULL end_time fails the overlap comparison, so open-ended rows
        // only match on an identical start
        let overlap = Condition::any()
            .add(
                Condition::all()
                    .add(booking::Column::StartTime.lt(end))
                    .add(booking::Column::EndTime.gt(start)),
            )
            .add(booking::Column::StartTime.eq(start));

        self.find_many(
            open_statuses()
                .add(booking::Column::SpotNumber.eq(spot_number))
                .add(overlap),
        )
        .await
    }

    async fn find_current_holders(
        &self,
        spot_number: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        self.find_many(
            open_statuses()
                .add(booking::Column::SpotNumber.eq(spot_number))
                .add(booking::Column::StartTime.lte(at))
                .add(
                    Condition::any()
                        .add(booking::Column::EndTime.is_null())
                        .add(booking::Column::EndTime.gt(at)),
                ),
        )
        .await
    }

    async fn transition(&self, id: Uuid, change: StatusChange) -> DomainResult<Option<Booking>> {
        debug!(
            "Booking {} transition {} -> {}",
            id,
            change.from.as_str(),
            change.to.as_str()
        );

        let mut update = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(change.to.as_str()))
            .col_expr(booking::Column::UpdatedAt, Expr::value(change.at));
        if let Some(end) = change.end_time {
            update = update.col_expr(booking::Column::EndTime, Expr::value(end));
        }
        if let Some(amount) = change.total_amount {
            update = update.col_expr(booking::Column::TotalAmount, Expr::value(amount));
        }

        let result = match update
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(change.from.as_str()))
            .exec(&self.db)
            .await
        {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) && change.to == BookingStatus::Active => {
                let vehicle_id = self
                    .find_by_id(id)
                    .await?
                    .map(|b| b.vehicle_id)
                    .ok_or_else(|| DomainError::not_found("Booking", "id", id))?;
                return Err(vehicle_already_active(vehicle_id));
            }
            Err(e) => return Err(db_err(e)),
        };

        if result.rows_affected == 0 {
            return match self.find_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(DomainError::not_found("Booking", "id", id)),
            };
        }

        self.find_by_id(id)
            .await?
            .map(Some)
            .ok_or_else(|| DomainError::not_found("Booking", "id", id))
    }
}
