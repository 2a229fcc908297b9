use std::fs;
use tempfile::TempDir;

use nutribot_core::catalog::FoodCatalog;
use nutribot_core::config::{resolve_with_base, Config, Settings};
use nutribot_core::traits::FoodRepository;
use nutribot_core::Error;
use nutribot_core::types::SizeBucket;

const CORNFLAKES: &str = r#"{
  "foods": [
    {
      "uuid": "c0a1",
      "name": "Cornflakes",
      "ingredients": ["mais"],
      "servings": {"medium": 30},
      "observations": [{"cho_ratio": 0.87, "protein_ratio": 0.07}]
    }
  ]
}"#;

#[test]
fn load_single_catalog_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("foods.json");
    fs::write(&path, CORNFLAKES).unwrap();

    let catalog = FoodCatalog::load(&path).expect("load");
    assert_eq!(catalog.len(), 1);

    let food = catalog.get_by_uuid("c0a1").expect("food");
    assert_eq!(food.name, "Cornflakes");
    assert_eq!(food.primary_ingredient(), Some("mais"));
    assert_eq!(food.servings.get(SizeBucket::Medium), Some(30));
    assert!(!food.liquid);

    let obs = catalog.list_observations("c0a1").expect("observations");
    assert_eq!(obs.len(), 1);
    assert_eq!(obs[0].cho_ratio, Some(0.87));
}

#[test]
fn load_directory_reads_nested_json_only() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("cereali")).unwrap();
    fs::write(dir.join("cereali/a.json"), CORNFLAKES).unwrap();
    fs::write(
        dir.join("b.json"),
        r#"[{"uuid": "l1", "name": "Latte intero", "ingredients": ["latte"], "liquid": true,
            "observations": [{"cho_ratio": 0.05}]}]"#,
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "not a catalog").unwrap();

    let catalog = FoodCatalog::load(dir).expect("load dir");
    assert_eq!(catalog.len(), 2);
    assert!(catalog.get_by_uuid("l1").expect("milk").liquid);
}

#[test]
fn unusable_entries_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("foods.json");
    fs::write(
        &path,
        r#"[
          {"uuid": "a", "name": "Senza ingredienti", "ingredients": [], "observations": [{"cho_ratio": 0.1}]},
          {"uuid": "b", "name": "Senza valori", "ingredients": ["acqua"], "observations": [{}]},
          {"uuid": "c", "name": "Mela", "ingredients": ["Mela "], "observations": [{"cho_ratio": 0.1}]}
        ]"#,
    )
    .unwrap();

    let catalog = FoodCatalog::load(&path).expect("load");
    assert_eq!(catalog.len(), 1);
    let food = catalog.get_by_uuid("c").expect("mela");
    assert_eq!(food.ingredients, vec!["mela".to_string()]);
    assert!(catalog.get_by_uuid("a").unwrap_err().is_not_found());
}

#[test]
fn high_variability_marker_expands_observations() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("foods.json");
    fs::write(
        &path,
        r#"[{"uuid": "p", "name": "Pizza margherita (v.m.)", "ingredients": ["pizza"],
             "observations": [{"cho_ratio": 0.5}]}]"#,
    )
    .unwrap();

    let catalog = FoodCatalog::load(&path).expect("load");
    let food = catalog.get_by_uuid("p").expect("pizza");
    assert_eq!(food.name, "Pizza margherita");

    let cho: Vec<f64> = catalog
        .list_observations("p")
        .expect("observations")
        .iter()
        .filter_map(|o| o.cho_ratio)
        .collect();
    assert_eq!(cho.len(), 3);
    for (value, expected) in cho.iter().zip([0.4, 0.5, 0.6]) {
        assert!((value - expected).abs() < 1e-9, "{value} != {expected}");
    }
}

#[test]
fn missing_uuid_is_derived_from_the_food() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("foods.json");
    fs::write(
        &path,
        r#"[
          {"name": "Banana", "ingredients": ["banana"], "observations": [{"cho_ratio": 0.2}]},
          {"name": "Banana", "ingredients": ["banana", "cioccolato"], "observations": [{"cho_ratio": 0.4}]}
        ]"#,
    )
    .unwrap();

    let first = FoodCatalog::load(&path).expect("load");
    let second = FoodCatalog::load(&path).expect("reload");
    let ids = |c: &FoodCatalog| c.foods().iter().map(|f| f.uuid.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.len(), 2);
    assert_ne!(ids(&first)[0], ids(&first)[1]);

    let uuid = &ids(&first)[0];
    assert_eq!(uuid.len(), 36);
    assert_eq!(second.get_by_uuid(uuid).expect("banana").name, "Banana");
}

#[test]
fn malformed_catalog_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(FoodCatalog::load(&path).is_err());
}

#[test]
fn config_layers_defaults_file_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[search]\nmin_score = 0.4\n[data]\nindex_prefix = \"dev_\"\n")?;
        jail.create_file("config.test.toml", "[data]\nindex_prefix = \"test_\"\n")?;
        jail.set_env("APP_SEARCH__MAX_DIFF", "0.2");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        pretty_assertions::assert_eq!(settings.search.min_score, 0.4);
        pretty_assertions::assert_eq!(settings.search.max_diff, 0.2);
        pretty_assertions::assert_eq!(settings.search.limit, 50);
        pretty_assertions::assert_eq!(settings.data.index_prefix.as_deref(), Some("test_"));
        pretty_assertions::assert_eq!(settings.bot, Settings::default().bot);
        Ok(())
    });
}

#[test]
fn config_rejects_out_of_range_max_diff() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[search]\nmax_diff = 1.5\n")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn invalid_settings_report_invalid_config() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());

    settings.search.limit = 0;
    let err = settings.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("search.limit")), "{err}");

    settings.search.limit = 50;
    settings.bot.variability_threshold = -0.1;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/nutribot");
    assert_eq!(resolve_with_base(base, "data/indexes"), base.join("data/indexes"));
    assert_eq!(resolve_with_base(base, "/tmp/idx"), std::path::PathBuf::from("/tmp/idx"));
}
