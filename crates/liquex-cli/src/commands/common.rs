use liquex_core::analytics::RequestAnalytics;
use liquex_core::models::{Notification, SafeSpot, TransactionKind};
use liquex_core::util::{format_time_ago, unix_millis_now};
use liquex_core::{
    GeoPoint, Liquex, LiquexConfig, LocationFix, Nearby, Neighbour, ProximityBand, RequestView,
    SqliteStore, Transaction, Transfer,
};
use serde::Serialize;

use crate::cli::GlobalArgs;
use crate::error::CliError;

pub type App = Liquex<SqliteStore>;

/// Load config, open the store and log in as `--user`.
///
/// Login notifications are logged rather than printed so listing output stays
/// machine-readable.
pub fn open_app(global: &GlobalArgs, now_ms: i64) -> Result<App, CliError> {
    let config = LiquexConfig::load(global.config.as_deref())?;
    let db_path = global
        .db_path
        .clone()
        .unwrap_or_else(|| config.resolve_database_path());
    let store = SqliteStore::open(&db_path)?;

    let fix = location_fix(global.lat, global.lng)?;
    let mut app = Liquex::new(store, config, now_ms);
    for notification in app.login(&global.user, fix, now_ms)? {
        tracing::info!("{notification}");
    }
    Ok(app)
}

/// Open the app and merge pending updates so listings are current
pub fn open_synced_app(global: &GlobalArgs) -> Result<(App, i64), CliError> {
    let now_ms = unix_millis_now();
    let mut app = open_app(global, now_ms)?;
    for notification in app.sync(now_ms)?.notifications {
        tracing::info!("{notification}");
    }
    Ok((app, now_ms))
}

pub fn location_fix(lat: Option<f64>, lng: Option<f64>) -> Result<LocationFix, CliError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
            if valid {
                Ok(LocationFix::Granted(GeoPoint::new(lat, lng)))
            } else {
                Err(CliError::InvalidLocation { lat, lng })
            }
        }
        _ => Ok(LocationFix::Unavailable),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_lines(lines: impl IntoIterator<Item = String>) {
    for line in lines {
        println!("{line}");
    }
}

#[derive(Debug, Serialize)]
pub struct RequestListItem {
    pub id: u64,
    pub amount: f64,
    pub kind: String,
    pub urgency: String,
    pub category: String,
    pub description: String,
    pub requester: String,
    pub external: bool,
    pub created_at: i64,
    pub relative_time: String,
    pub distance_m: Option<f64>,
    pub band: Option<ProximityBand>,
    pub is_recent: bool,
    pub from_new_user: bool,
}

pub fn request_to_list_item(view: &RequestView, now_ms: i64) -> RequestListItem {
    let request = &view.request;
    RequestListItem {
        id: request.id.0,
        amount: request.amount,
        kind: request.kind.to_string(),
        urgency: request.urgency.to_string(),
        category: request.category.clone(),
        description: request.description.clone(),
        requester: request.requester.clone(),
        external: request.is_external(),
        created_at: request.created_at,
        relative_time: format_time_ago(request.created_at, now_ms),
        distance_m: view.distance_m,
        band: view.band,
        is_recent: view.is_recent,
        from_new_user: view.from_new_user,
    }
}

pub fn format_request_lines(views: &[RequestView], now_ms: i64) -> Vec<String> {
    if views.is_empty() {
        return vec!["No outstanding requests".to_string()];
    }

    views
        .iter()
        .map(|view| {
            let request = &view.request;
            let marker = view.band.map_or("[?]", ProximityBand::marker);
            let mut flags = String::new();
            if view.is_recent {
                flags.push_str(" NEW");
            }
            if view.from_new_user {
                flags.push_str(" new-user");
            }
            if request.is_external() {
                flags.push_str(" external");
            }
            format!(
                "{marker} {id}  ${amount:.2} {kind} ({urgency}, {category}) from {requester}, {distance}, {age}{flags}",
                id = request.id,
                amount = request.amount,
                kind = request.kind,
                urgency = request.urgency,
                category = request.category,
                requester = request.requester,
                distance = format_distance(view.distance_m),
                age = format_time_ago(request.created_at, now_ms),
            )
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct NeighbourListItem {
    pub username: String,
    pub distance_m: f64,
    pub band: ProximityBand,
    pub rating: f64,
    pub completed_transactions: u32,
    pub is_online: bool,
    pub device_type: Option<String>,
}

pub fn neighbour_to_list_item(nearby: &Nearby<Neighbour>, radius_m: f64) -> NeighbourListItem {
    let user = nearby.entity.user();
    NeighbourListItem {
        username: user.username.clone(),
        distance_m: nearby.distance_m,
        band: nearby.band(radius_m),
        rating: user.rating,
        completed_transactions: user.completed_transactions,
        is_online: user.is_online,
        device_type: nearby.entity.device_type().map(|device| device.to_string()),
    }
}

pub fn format_neighbour_lines(neighbours: &[Nearby<Neighbour>], radius_m: f64) -> Vec<String> {
    if neighbours.is_empty() {
        return vec!["Nobody nearby".to_string()];
    }

    neighbours
        .iter()
        .map(|nearby| {
            let user = nearby.entity.user();
            let device = nearby
                .entity
                .device_type()
                .map(|device| format!(" via {device}"))
                .unwrap_or_default();
            format!(
                "{} {}  {:.0}m, rating {:.1}, {} completed{}",
                nearby.band(radius_m).marker(),
                user.username,
                nearby.distance_m,
                user.rating,
                user.completed_transactions,
                device
            )
        })
        .collect()
}

pub fn format_meetup_lines(spots: &[Nearby<SafeSpot>]) -> Vec<String> {
    if spots.is_empty() {
        return vec!["No meet-up spots".to_string()];
    }

    spots
        .iter()
        .map(|spot| {
            format!(
                "{}  {:.0}m ({:?} safety)",
                spot.entity.name, spot.distance_m, spot.entity.safety
            )
        })
        .collect()
}

pub const fn transaction_kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Money => "money",
        TransactionKind::Service => "service",
        TransactionKind::Goods => "goods",
        TransactionKind::ProximityTransfer => "proximity transfer",
    }
}

pub fn format_transaction_line(transaction: &Transaction, now_ms: i64) -> String {
    let rating = transaction
        .rating
        .map(|rating| format!(", rated {rating}/5"))
        .unwrap_or_default();
    format!(
        "{}  ${:.2} {} {} -> {}, {}{}",
        transaction.id,
        transaction.amount,
        transaction_kind_label(transaction.kind),
        transaction.responder,
        transaction.requester,
        format_time_ago(transaction.timestamp, now_ms),
        rating
    )
}

pub fn format_transfer_line(transfer: &Transfer, now_ms: i64) -> String {
    let reason = transfer
        .reason
        .as_deref()
        .map(|reason| format!(" for {reason}"))
        .unwrap_or_default();
    format!(
        "{}  ${:.2} {} -> {}{} ({:.0}m apart, {})",
        transfer.id,
        transfer.amount,
        transfer.sender,
        transfer.recipient,
        reason,
        transfer.distance_m,
        format_time_ago(transfer.created_at, now_ms)
    )
}

pub fn format_analytics_lines(analytics: &RequestAnalytics) -> Vec<String> {
    let mut lines = vec![
        format!("Requests: {}", analytics.total_requests),
        format!("Total amount: ${:.2}", analytics.total_amount),
        format!("Average amount: ${:.2}", analytics.average_amount),
    ];
    for (kind, count) in &analytics.by_kind {
        lines.push(format!("  {kind}: {count}"));
    }
    for (urgency, count) in &analytics.by_urgency {
        lines.push(format!("  {urgency} urgency: {count}"));
    }
    lines
}

pub fn format_notification_lines(notifications: &[Notification]) -> Vec<String> {
    notifications
        .iter()
        .map(|notification| format!("* {notification}"))
        .collect()
}

pub fn format_distance(distance_m: Option<f64>) -> String {
    distance_m.map_or_else(
        || "Unknown distance".to_string(),
        |distance| format!("{distance:.0}m away"),
    )
}
