use std::path::PathBuf;
use std::sync::Arc;

use lighter_insights::data::aggregate;
use lighter_insights::{
    DashboardConfig, DashboardError, DashboardSession, DatasetRepository, PanelOutput, Value,
    ViewPreset,
};

const SALES_CSV: &str = "\
ItemID,BrandName,CategoryName,ModelName,Quantity,UnitPrice,Discount,SubTotal
1,Bic,Disposable,J26,10,5.0,0.0,50.0
2,Zippo,Refillable,Armor,2,180.0,18.0,342.0
3,Bic,Electronic,J38,6,4.0,0.0,24.0
4,Clipper,Refillable,Micro,30,9.5,5.0,280.0
5,Zippo,Refillable,Street,1,150.0,0.0,150.0
";

const PROFILE_CSV: &str = "\
UserID,Name,Age,Gender,IncomeBracket,SmokerLabel,HouseholdIncome
1,Ana Silva,23,Female,Low,Smoker,2500.0
2,Bruno Costa,35,Male,Medium,Non-smoker,6400.0
3,Carla Lima,52,Female,High,Non-smoker,15000.0
";

fn data_dir(name: &str, with_profile: bool) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lighter-it-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("sales_items.csv"), SALES_CSV).unwrap();
    if with_profile {
        std::fs::write(dir.join("user_profile.csv"), PROFILE_CSV).unwrap();
    }
    dir
}

fn repository(dir: PathBuf) -> DatasetRepository {
    let config = DashboardConfig {
        data_dir: dir,
        ..Default::default()
    };
    DatasetRepository::from_catalog(config.catalog())
}

#[test]
fn popularity_view_end_to_end() {
    let repo = repository(data_dir("popularity", true));
    let table = repo.load("sales").unwrap();
    assert!(Arc::ptr_eq(&table, &repo.load("sales").unwrap()));

    let mut session = DashboardSession::new(table, ViewPreset::popularity()).unwrap();
    assert_eq!(session.range_extent("UnitPrice").unwrap(), (4.0, 180.0));

    session.toggle_value("CategoryName", &Value::from("Electronic")).unwrap();
    session.set_range("UnitPrice", 5.0, 150.0).unwrap();
    assert_eq!(session.view().len(), 3);

    let top = aggregate::top_n_grouped_sum(session.view(), "BrandName", "Quantity", 5).unwrap();
    let brands: Vec<(String, f64)> = top
        .into_iter()
        .map(|g| (g.group.to_string(), g.total))
        .collect();
    assert_eq!(
        brands,
        vec![
            ("Clipper".to_string(), 30.0),
            ("Bic".to_string(), 10.0),
            ("Zippo".to_string(), 1.0),
        ]
    );

    let report = session.report().unwrap();
    assert_eq!(report.statistic("Total Items Sold"), Some(41.0));
    assert!(matches!(report.panels[2], PanelOutput::Histogram { .. }));
}

#[test]
fn segmentation_view_end_to_end() {
    let repo = repository(data_dir("segmentation", true));
    let table = repo.load("profile").unwrap();
    let mut session = DashboardSession::new(table, ViewPreset::segmentation()).unwrap();

    session.toggle_value("Gender", &Value::from("Male")).unwrap();
    let report = session.report().unwrap();

    assert_eq!(report.statistic("Filtered Users"), Some(2.0));
    assert_eq!(report.statistic("Average Household Income"), Some(8750.0));
    let shares = report
        .panels
        .iter()
        .find_map(|p| match p {
            PanelOutput::Proportions { shares, .. } => Some(shares),
            _ => None,
        })
        .unwrap();
    let total: f64 = shares.iter().map(|s| s.fraction).sum();
    assert!((total - 1.0).abs() < 1e-9);

    session.set_range("Age", 60.0, 70.0).unwrap();
    assert_eq!(session.report(), Err(DashboardError::EmptyResult));
}

#[test]
fn missing_dataset_is_recoverable() {
    let repo = repository(data_dir("missing", false));

    assert!(repo.load("sales").is_ok());
    match repo.load("profile") {
        Err(DashboardError::SourceNotFound { source_id, .. }) => assert_eq!(source_id, "profile"),
        other => panic!("expected SourceNotFound, got {other:?}"),
    }
}
