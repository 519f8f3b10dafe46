//! Read-side views over stored itineraries: the share message and the
//! per-day agenda across all of a user's plans.

use chrono::{FixedOffset, NaiveDate};

use crate::models::plan::{PlanStop, PlanWithItems};

/// Sorts stops by start time. Ties keep their stored order.
pub fn sort_stops(stops: &mut [PlanStop]) {
    stops.sort_by(|a, b| {
        a.item
            .scheduled_for
            .cmp(&b.item.scheduled_for)
            .then(a.item.order.cmp(&b.item.order))
    });
}

/// The text handed to the platform share sheet:
///
/// ```text
/// Old Town Walk
///
/// Itinerary:
/// 9:00 AM - Grand Mosque (60 min)
/// 10:00 AM - Spice Souk (30 min)
/// ```
pub fn share_text(plan: &PlanWithItems, offset: FixedOffset) -> String {
    let mut stops = plan.items.clone();
    sort_stops(&mut stops);

    let lines = stops
        .iter()
        .map(|stop| {
            let time = stop
                .item
                .scheduled_for
                .with_timezone(&offset)
                .format("%-I:%M %p");
            let name = stop
                .place
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("Unknown place");
            format!("{time} - {name} ({} min)", stop.item.duration_minutes)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n\nItinerary:\n{}", plan.plan.name, lines)
}

/// Every stop, across `plans`, whose local start date is `date`.
pub fn agenda_for_date(plans: &[PlanWithItems], date: NaiveDate, offset: FixedOffset) -> Vec<PlanStop> {
    let mut stops: Vec<PlanStop> = plans
        .iter()
        .flat_map(|plan| plan.items.iter())
        .filter(|stop| stop.item.scheduled_for.with_timezone(&offset).date_naive() == date)
        .cloned()
        .collect();
    sort_stops(&mut stops);
    stops
}
