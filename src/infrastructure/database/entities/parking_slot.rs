//! Parking slot entity
//!
//! One row per slot; `occupied` is flipped with conditional updates.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "parking_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub location_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub number: String,
    pub occupied: bool,
    /// standard, handicap or electric
    pub slot_type: String,
    /// Allocation order within the location
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_location::Entity",
        from = "Column::LocationId",
        to = "super::parking_location::Column::Id",
        on_delete = "Cascade"
    )]
    Location,
}

impl Related<super::parking_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
