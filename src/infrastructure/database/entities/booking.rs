//! Booking entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub user_id: Uuid,
    pub location_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub end_time: Option<DateTime<Utc>>,
    /// pending, active, completed, cancelled
    pub status: String,
    #[sea_orm(nullable)]
    pub spot_number: Option<String>,
    #[sea_orm(nullable)]
    pub total_amount: Option<i64>,
    /// pre_booked or on_site
    pub booking_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
