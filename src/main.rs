use holidaze::availability::parse_day;
use holidaze::booking::BookingCalendar;
use holidaze::config::env_loader::load_config;
use holidaze::display::{format_stay, format_title};
use holidaze::holidaze::api::HolidazeAPI;
use holidaze::holidaze::search::{search_venues, VenueQuery};
use holidaze::tracing::setup_loki;
use std::env;
use std::error::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let loki = setup_loki().await;

    if let Err(err) = run(env::args().skip(1).collect()).await {
        error!("{}", err);
    }

    if let Some((controller, handle)) = loki {
        controller.shutdown().await;
        let _ = handle.await;
    }
}

/**
Without arguments lists venues.
With `search <location> [guests] [from to]` lists the venues matching those filters.
With `<venue-id> <from> <to>` checks whether that stay can be booked
*/
async fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let api = HolidazeAPI::from_config(&config);

    let Some(venue_id) = args.first() else {
        let venues = api.get_all_venues().await?;
        let limit = config.debug_config.venue_limit.unwrap_or(venues.len());

        venues.iter().take(limit).for_each(|venue| {
            info!(
                "{} ({}): {} bookings, up to {} guests",
                format_title(&venue.name),
                venue.id,
                venue.bookings.len(),
                venue.max_guests
            )
        });

        return Ok(());
    };

    if venue_id == "search" {
        return search(&api, &args[1..]).await;
    }

    let venue = api.get_venue(Uuid::parse_str(venue_id)?).await?;
    let mut calendar = BookingCalendar::for_venue(&venue);

    if calendar.skipped_reservations() > 0 {
        warn!("Some availability data could not be loaded");
    }

    for booking in &venue.bookings {
        info!(
            "{}: {} ({} guests)",
            booking.customer_name(),
            format_stay(booking.reservation.date_from(), booking.reservation.date_to()),
            booking.guests
        );
    }

    if let [_, from, to, ..] = args.as_slice() {
        calendar.select(parse_day(from)?);
        calendar.select(parse_day(to)?);

        let today = chrono::Local::now().date_naive();

        match calendar.validate(today) {
            Ok((start, end)) => info!("{} is free for {}", venue.name, format_stay(start, end)),
            Err(err) => warn!("{} can't be booked: {}", venue.name, err),
        }
    }

    Ok(())
}

async fn search(api: &HolidazeAPI, args: &[String]) -> Result<(), Box<dyn Error>> {
    let mut query = VenueQuery::default();

    if let Some(location) = args.first() {
        query = query.with_location(location);
    }
    if let Some(guests) = args.get(1) {
        query = query.with_guests(guests.parse()?);
    }
    if let [_, _, from, to, ..] = args {
        query = query.with_dates(parse_day(from)?, parse_day(to)?);
    }

    let venues = api.get_all_venues().await?;

    for venue in search_venues(&venues, &query)? {
        info!(
            "{} ({}, {}): up to {} guests",
            format_title(&venue.name),
            venue.location.city,
            venue.location.country,
            venue.max_guests
        );
    }

    Ok(())
}
