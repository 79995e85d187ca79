use clap::Parser;
use liquex_core::models::{Notification, RequestKind, TransactionKind, Urgency};
use liquex_core::util::unix_millis_now;
use liquex_core::{GeoPoint, LocationFix, RequestDraft, RequestId, TransferDraft};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands, CompletionShell, GlobalArgs};
use crate::commands::common::{
    format_analytics_lines, format_distance, format_notification_lines, format_request_lines,
    location_fix, open_app, request_to_list_item, transaction_kind_label,
};
use crate::commands::completions::render_completions;
use crate::commands::raise::RaiseArgs;
use crate::commands::run::run_simulation;
use crate::error::CliError;

const DEMO_LAT: f64 = 16.922_251;
const DEMO_LNG: f64 = 82.000_117;

fn temp_globals(dir: &tempfile::TempDir, user: &str) -> GlobalArgs {
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, "{}").unwrap();
    GlobalArgs {
        db_path: Some(dir.path().join("liquex.db")),
        config: Some(config_path),
        user: user.to_string(),
        lat: Some(DEMO_LAT),
        lng: Some(DEMO_LNG),
    }
}

#[test]
fn location_fix_needs_both_coordinates() {
    assert_eq!(
        location_fix(Some(1.5), Some(-2.5)).unwrap(),
        LocationFix::Granted(GeoPoint::new(1.5, -2.5))
    );
    assert_eq!(location_fix(None, None).unwrap(), LocationFix::Unavailable);
    assert_eq!(location_fix(Some(1.0), None).unwrap(), LocationFix::Unavailable);
}

#[test]
fn location_fix_rejects_out_of_range_coordinates() {
    assert!(matches!(
        location_fix(Some(91.0), Some(0.0)),
        Err(CliError::InvalidLocation { .. })
    ));
    assert!(matches!(
        location_fix(Some(0.0), Some(-180.5)),
        Err(CliError::InvalidLocation { .. })
    ));
}

#[test]
fn parses_raise_with_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "liquex",
        "raise",
        "12.5",
        "--kind",
        "goods",
        "--category",
        "food",
        "--user",
        "alice",
        "--lat",
        "-33.9",
        "--lng",
        "18.4",
    ])
    .unwrap();

    assert_eq!(cli.global.user, "alice");
    assert_eq!(cli.global.lat, Some(-33.9));
    match cli.command {
        Some(Commands::Raise {
            amount,
            kind,
            urgency,
            category,
            description,
        }) => {
            assert!((amount - 12.5).abs() < f64::EPSILON);
            assert_eq!(kind, RequestKind::Goods);
            assert_eq!(urgency, Urgency::Medium);
            assert_eq!(category, "food");
            assert_eq!(description, None);
        }
        _ => panic!("expected raise"),
    }
}

#[test]
fn user_defaults_to_demo() {
    let cli = Cli::try_parse_from(["liquex", "requests", "--json"]).unwrap();
    assert_eq!(cli.global.user, "demo");
    assert!(matches!(
        cli.command,
        Some(Commands::Requests {
            limit: 20,
            json: true
        })
    ));
}

#[test]
fn lat_without_lng_is_rejected() {
    assert!(Cli::try_parse_from(["liquex", "nearby", "--lat", "1.0"]).is_err());
}

#[test]
fn unknown_request_kind_is_rejected() {
    assert!(Cli::try_parse_from([
        "liquex",
        "raise",
        "5",
        "--kind",
        "favour",
        "--category",
        "misc"
    ])
    .is_err());
}

#[test]
fn parses_request_ids() {
    let cli = Cli::try_parse_from(["liquex", "accept", "1700000000000"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Accept { id }) if id == RequestId(1_700_000_000_000)
    ));
}

#[test]
fn format_distance_handles_unknown() {
    assert_eq!(format_distance(None), "Unknown distance");
    assert_eq!(format_distance(Some(149.6)), "150m away");
}

#[test]
fn format_request_lines_reports_empty_list() {
    assert_eq!(
        format_request_lines(&[], 0),
        vec!["No outstanding requests".to_string()]
    );
}

#[test]
fn transaction_kinds_have_readable_labels() {
    assert_eq!(transaction_kind_label(TransactionKind::Money), "money");
    assert_eq!(
        transaction_kind_label(TransactionKind::ProximityTransfer),
        "proximity transfer"
    );
}

#[test]
fn notification_lines_are_bulleted() {
    let lines = format_notification_lines(&[Notification::NewUserNearby {
        username: "Jane Smith".to_string(),
        distance_m: 42.0,
    }]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("* "));
    assert!(lines[0].contains("Jane Smith"));
}

#[test]
fn raise_args_fill_every_draft_field() {
    let draft: RequestDraft = RaiseArgs {
        amount: 9.0,
        kind: RequestKind::Service,
        urgency: Urgency::High,
        category: "transport".to_string(),
        description: Some("Ride to the station".to_string()),
    }
    .into();

    assert_eq!(draft.kind, Some(RequestKind::Service));
    assert_eq!(draft.urgency, Some(Urgency::High));
    assert_eq!(draft.category.as_deref(), Some("transport"));
}

#[test]
fn request_raised_by_one_user_is_listed_for_another() {
    let dir = tempfile::tempdir().unwrap();
    let now = unix_millis_now();

    let mut alice = open_app(&temp_globals(&dir, "alice"), now).unwrap();
    let raised = alice
        .raise_request(
            RaiseArgs {
                amount: 7.25,
                kind: RequestKind::Money,
                urgency: Urgency::Low,
                category: "food".to_string(),
                description: None,
            }
            .into(),
            now,
        )
        .unwrap();
    drop(alice);

    let demo = open_app(&temp_globals(&dir, "demo"), now + 10).unwrap();
    let views = demo.outstanding_requests(now + 10);
    let view = views
        .iter()
        .find(|view| view.request.id == raised.id)
        .unwrap();

    let item = request_to_list_item(view, now + 10);
    assert_eq!(item.requester, "alice");
    assert_eq!(item.kind, "money");
    assert!(item.is_recent);
    assert!(item.distance_m.unwrap() < 1.0);

    let lines = format_request_lines(std::slice::from_ref(view), now + 10);
    assert!(lines[0].starts_with("[near]"));
    assert!(lines[0].contains("$7.25"));
}

#[test]
fn transfer_is_persisted_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let now = unix_millis_now();

    let mut app = open_app(&temp_globals(&dir, "demo"), now).unwrap();
    let (transfer, _) = app
        .transfer(
            TransferDraft {
                recipient: "Jane Smith".to_string(),
                amount: 5.0,
                reason: Some("coffee".to_string()),
                description: None,
            },
            now,
        )
        .unwrap();
    drop(app);

    let app = open_app(&temp_globals(&dir, "demo"), now + 1).unwrap();
    let transfers = app.registry().proximity_transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].id, transfer.id);
    assert!(app
        .history()
        .iter()
        .any(|transaction| transaction.kind == TransactionKind::ProximityTransfer));
}

#[test]
fn analytics_lines_include_totals() {
    let dir = tempfile::tempdir().unwrap();
    let app = open_app(&temp_globals(&dir, "demo"), unix_millis_now()).unwrap();
    let lines = format_analytics_lines(&app.analytics());
    assert!(lines[0].starts_with("Requests: "));
    assert!(lines.iter().any(|line| line.starts_with("Average amount: $")));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut globals = temp_globals(&dir, "demo");
    globals.config = Some(dir.path().join("missing.json"));
    assert!(matches!(
        open_app(&globals, unix_millis_now()),
        Err(CliError::Core(liquex_core::Error::Config(_)))
    ));
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("liquex"));
}

#[tokio::test]
async fn simulation_stops_when_duration_elapses() {
    let dir = tempfile::tempdir().unwrap();
    let globals = temp_globals(&dir, "demo");
    run_simulation(&globals, Some(0), 10, Some(7)).await.unwrap();
}

#[tokio::test]
async fn simulation_rejects_zero_tick_interval() {
    let dir = tempfile::tempdir().unwrap();
    let globals = temp_globals(&dir, "demo");
    assert!(matches!(
        run_simulation(&globals, Some(0), 0, None).await,
        Err(CliError::InvalidTickInterval)
    ));
}
