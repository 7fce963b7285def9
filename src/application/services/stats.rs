//! Per-user booking statistics

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Booking, BookingStatus, DomainResult, RepositoryProvider};

const FAVORITE_LOCATIONS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub total_bookings: usize,
    /// Pending plus active
    pub active_bookings: usize,
    pub completed_bookings: usize,
    pub cancelled_bookings: usize,
    pub total_spent_amount: i64,
    /// Mean stay of completed bookings, in hours
    pub average_booking_duration: f64,
    /// Start of the most recently created booking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_booking_date: Option<DateTime<Utc>>,
    /// Earliest future start among open bookings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upcoming_booking_date: Option<DateTime<Utc>>,
    /// Most booked locations, busiest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_locations: Vec<Uuid>,
}

impl UserStats {
    pub fn from_bookings(bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let mut stats = UserStats {
            total_bookings: bookings.len(),
            ..Default::default()
        };
        let mut completed_hours = 0.0;
        let mut per_location: HashMap<Uuid, usize> = HashMap::new();

        for booking in bookings {
            *per_location.entry(booking.location_id).or_default() += 1;

            match booking.status {
                BookingStatus::Cancelled => stats.cancelled_bookings += 1,
                BookingStatus::Completed => {
                    stats.completed_bookings += 1;
                    stats.total_spent_amount += booking.total_amount.unwrap_or(0);
                    if let Some(end) = booking.end_time {
                        completed_hours +=
                            (end - booking.start_time).num_seconds() as f64 / 3600.0;
                    }
                }
                BookingStatus::Pending | BookingStatus::Active => {
                    stats.active_bookings += 1;
                    if booking.start_time > now {
                        stats.upcoming_booking_date = Some(
                            stats
                                .upcoming_booking_date
                                .map_or(booking.start_time, |d| d.min(booking.start_time)),
                        );
                    }
                }
            }
        }

        if stats.completed_bookings > 0 {
            stats.average_booking_duration = completed_hours / stats.completed_bookings as f64;
        }

        stats.last_booking_date = bookings
            .iter()
            .max_by_key(|b| (b.created_at, b.id))
            .map(|b| b.start_time);

        let mut ranked: Vec<(Uuid, usize)> = per_location.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        stats.favorite_locations = ranked
            .into_iter()
            .take(FAVORITE_LOCATIONS)
            .map(|(id, _)| id)
            .collect();

        stats
    }
}

#[derive(Clone)]
pub struct UserStatsService {
    repos: Arc<dyn RepositoryProvider>,
}

impl UserStatsService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn user_stats(&self, user_id: Uuid) -> DomainResult<UserStats> {
        let bookings = self.repos.bookings().find_by_user(user_id).await?;
        Ok(UserStats::from_bookings(&bookings, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::StatusChange;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, hour, 0, 0).unwrap()
    }

    fn on_site(location: Uuid, start: DateTime<Utc>, created: DateTime<Utc>) -> Booking {
        Booking::on_site(Uuid::new_v4(), Uuid::new_v4(), location, "A1", start, created)
    }

    #[test]
    fn empty_history() {
        let stats = UserStats::from_bookings(&[], at(12));
        assert_eq!(stats, UserStats::default());
    }

    #[test]
    fn summarises_mixed_history() {
        let home = Uuid::new_v4();
        let work = Uuid::new_v4();
        let now = at(12);

        let mut done = on_site(home, at(8), at(8));
        done.apply(&StatusChange::completing(BookingStatus::Active, at(10), 200, at(10)));
        let mut short = on_site(home, at(10), at(10));
        short.apply(&StatusChange::completing(BookingStatus::Active, at(11), 100, at(11)));

        let mut cancelled = Booking::pre_booked(
            Uuid::new_v4(), Uuid::new_v4(), work, "B1", at(15), None, at(9),
        );
        cancelled.apply(&StatusChange::new(BookingStatus::Pending, BookingStatus::Cancelled, at(9)));

        let later = Booking::pre_booked(
            Uuid::new_v4(), Uuid::new_v4(), work, "B2", at(18), None, at(11) + Duration::minutes(30),
        );
        let sooner = Booking::pre_booked(
            Uuid::new_v4(), Uuid::new_v4(), home, "A3", at(14), None, at(7),
        );

        let stats = UserStats::from_bookings(&[done, short, cancelled, later, sooner], now);
        assert_eq!(stats.total_bookings, 5);
        assert_eq!(stats.completed_bookings, 2);
        assert_eq!(stats.cancelled_bookings, 1);
        assert_eq!(stats.active_bookings, 2);
        assert_eq!(stats.total_spent_amount, 300);
        assert!((stats.average_booking_duration - 1.5).abs() < 1e-9);
        assert_eq!(stats.upcoming_booking_date, Some(at(14)));
        assert_eq!(stats.last_booking_date, Some(at(18)));
        assert_eq!(stats.favorite_locations[0], home);
        assert_eq!(stats.favorite_locations.len(), 2);
    }

    #[test]
    fn last_booking_follows_creation_time() {
        let loc = Uuid::new_v4();
        let old = on_site(loc, at(9), at(9));
        let newest = on_site(loc, at(7), at(9) + Duration::minutes(30));
        let stats = UserStats::from_bookings(&[newest, old], at(12));
        assert_eq!(stats.last_booking_date, Some(at(7)));
    }
}
