use std::fs;
use std::sync::Arc;

use flightdash::{
    Config, Dashboard, DashboardSettings, FlightError, FlightTable, IntervalReport,
};
use tempfile::TempDir;

const FLIGHTS_CSV: &str = "\
departure_date, arrival_date, depart_time, arrival_time, destination, airline, price, fly_score, day_of_week, month, mo_name
2020-01-27,2020-01-27,08:00:00,11:30:00,LAX,JetBlue,300,7.5,Monday,1,Jan
2020-02-03,2020-02-03,09:15:00,12:40:00,LAX,JetBlue,250,8.0,Monday,2,Feb
2020-02-03,2020-02-03,0 days 14:05:00,0 days 17:30:00,LAX,United,350,7.0,Monday,2,Feb
2020-02-04,2020-02-04,07:00,10:10,MIA,Spirit,120,5.5,Tuesday,2,Feb
2020-02-05,2020-02-05,18:45:00,20:55:00,ORD,American,200,6.5,Wednesday,2,Feb
2020-03-07,2020-03-08,23:10:00,02:20:00,ORD,United,180,7.0,Saturday,3,Mar
";

fn write_fixture(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("flights.csv");
    fs::write(&path, contents).unwrap();
    path
}

fn load(dir: &TempDir) -> FlightTable {
    let path = write_fixture(dir, FLIGHTS_CSV);
    FlightTable::from_csv(&path, &Config::default().load_options()).unwrap()
}

#[test]
fn test_load_csv_trims_headers_and_builds_catalog() {
    let dir = TempDir::new().unwrap();
    let table = load(&dir);

    assert_eq!(table.len(), 6);
    let catalog = table.catalog();
    assert!(catalog.has_destination("LAX"));
    assert!(catalog.has_airline("Spirit"));
    assert!(!catalog.has_destination("SJU"));

    let records = table.all().records().unwrap();
    assert_eq!(records[0].destination, "LAX");
    assert_eq!(records[0].mo_name(), "Jan");
}

#[test]
fn test_daily_and_monthly_views_from_csv() {
    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::new(Arc::new(load(&dir)), DashboardSettings::default());

    let daily = dashboard.daily_prices(["LAX", "ORD"]).unwrap();
    assert_eq!(daily.count, 5);
    assert_eq!(daily.count_label(), "Total Number of Flights: 5");
    assert_eq!(daily.daily.len(), 4);
    assert!(matches!(daily.interval, IntervalReport::Interval(_)));

    let monthly = dashboard.monthly_prices(["LAX"]).unwrap();
    assert_eq!(monthly.count, 3);
    // January is excluded from the grouped series only
    assert_eq!(monthly.ranked.len(), 1);
    assert_eq!(monthly.ranked[0].mean, 300.0);
    assert_eq!(monthly.ranked[0].count, 2);
}

#[test]
fn test_weekday_views_from_csv() {
    let dir = TempDir::new().unwrap();
    let dashboard = Dashboard::new(Arc::new(load(&dir)), DashboardSettings::default());
    let (destinations, airlines) = dashboard.default_weekday_selection();

    let prices = dashboard
        .price_by_weekday(destinations.clone(), airlines.clone())
        .unwrap();
    assert_eq!(prices.count, 6);
    assert_eq!(prices.days.len(), 7);
    assert_eq!(prices.days[0].day, "Monday");
    assert_eq!(prices.days[0].values, vec![300.0, 250.0, 350.0]);
    assert!(prices.days[6].values.is_empty());

    let ratings = dashboard.rating_by_weekday(destinations, airlines).unwrap();
    assert_eq!(ratings.days[5].values, vec![7.0]);
}

#[test]
fn test_config_file_drives_settings() {
    let dir = TempDir::new().unwrap();
    let csv = write_fixture(&dir, FLIGHTS_CSV);
    let config_path = dir.path().join("flightdash.toml");
    fs::write(
        &config_path,
        format!(
            "[data]\npath = {:?}\n\n[dashboard]\nprice_ceiling = 200.0\nexcluded_month = \"\"\n",
            csv.display().to_string()
        ),
    )
    .unwrap();

    let config = Config::discover(Some(&config_path)).unwrap();
    let table = FlightTable::from_csv(&config.data.path, &config.load_options()).unwrap();
    let settings = DashboardSettings::try_from(&config).unwrap();
    assert_eq!(settings.excluded_month, None);

    let dashboard = Dashboard::new(Arc::new(table), settings);
    let prices = dashboard
        .price_by_weekday(["LAX", "MIA", "ORD"], Vec::<String>::new())
        .unwrap();
    assert_eq!(prices.max_price, 200.0);
    assert_eq!(prices.count, 3);

    let monthly = dashboard.monthly_prices(["LAX"]).unwrap();
    assert_eq!(monthly.ranked.len(), 2);
}

#[test]
fn test_inconsistent_weekday_is_rejected() {
    let dir = TempDir::new().unwrap();
    let bad = FLIGHTS_CSV.replace("Tuesday", "Friday");
    let path = write_fixture(&dir, &bad);

    let err = FlightTable::from_csv(&path, &Config::default().load_options()).unwrap_err();
    assert!(matches!(err, FlightError::InvalidData(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = FlightTable::from_csv(
        dir.path().join("nope.csv"),
        &Config::default().load_options(),
    )
    .unwrap_err();
    assert!(matches!(err, FlightError::Io(_)));
}
