//! Create parking_locations and parking_slots tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLocations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingLocations::Name).string().not_null())
                    .col(ColumnDef::new(ParkingLocations::Address).string().not_null())
                    .col(
                        ColumnDef::new(ParkingLocations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLocations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ParkingSlots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ParkingSlots::LocationId).uuid().not_null())
                    .col(ColumnDef::new(ParkingSlots::Number).string_len(20).not_null())
                    .col(
                        ColumnDef::new(ParkingSlots::Occupied)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ParkingSlots::SlotType)
                            .string_len(20)
                            .not_null()
                            .default("standard"),
                    )
                    .col(ColumnDef::new(ParkingSlots::Position).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(ParkingSlots::LocationId)
                            .col(ParkingSlots::Number),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_slots_location")
                            .from(ParkingSlots::Table, ParkingSlots::LocationId)
                            .to(ParkingLocations::Table, ParkingLocations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_slots_number")
                    .table(ParkingSlots::Table)
                    .col(ParkingSlots::Number)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSlots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ParkingLocations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLocations {
    Table,
    Id,
    Name,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum ParkingSlots {
    Table,
    LocationId,
    Number,
    Occupied,
    SlotType,
    Position,
}
