use fibre_inject::{
  find_config_file_in, Container, ContainerConfig, Error, Qualifier, QualifierConfig,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::env;
use std::fs;

const YAML: &str = r#"
name: billing
qualifiers:
  - name: Premium
  - name: Tag
    repeatable: true
alternatives:
  - fakeLedger
"#;

#[test]
fn load_config_from_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("fibre_inject.yaml");
  fs::write(&path, YAML).unwrap();

  let config = ContainerConfig::from_file(&path).unwrap();
  assert_eq!(config.name, "billing");
  assert_eq!(
    config.qualifiers,
    vec![
      QualifierConfig {
        name: "Premium".to_string(),
        repeatable: false,
      },
      QualifierConfig {
        name: "Tag".to_string(),
        repeatable: true,
      },
    ]
  );
  assert_eq!(config.alternatives, vec!["fakeLedger".to_string()]);
}

#[test]
fn missing_file_is_a_read_error() {
  let dir = tempfile::tempdir().unwrap();
  let err = ContainerConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
  assert!(matches!(err, Error::ConfigRead(_)));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
  let err = ContainerConfig::from_yaml_str("qualifiers: {name: [").unwrap_err();
  assert!(matches!(err, Error::ConfigParse(_)));
}

#[test]
fn configured_qualifiers_are_recognised() {
  let config = ContainerConfig::from_yaml_str(YAML).unwrap();
  let container = Container::with_config(&config);
  assert_eq!(container.name(), "billing");

  struct Ledger(&'static str);
  container
    .bean(|_| Ledger("premium"))
    .qualified(Qualifier::new("Premium"))
    .qualified(Qualifier::new("Tag").with_member("value", "eu"))
    .qualified(Qualifier::new("Tag").with_member("value", "vat"))
    .register()
    .unwrap();
  container
    .bean(|_| Ledger("fake"))
    .named("fakeLedger")
    .qualified(Qualifier::new("Premium"))
    .alternative()
    .register()
    .unwrap();

  let premium = container
    .instance::<Ledger>()
    .select(&[Qualifier::new("Premium")])
    .unwrap();
  // The configured alternative outranks the regular bean.
  assert_eq!(premium.get().unwrap().0, "fake");

  let tagged = container
    .instance::<Ledger>()
    .select(&[Qualifier::new("Tag").with_member("value", "vat")])
    .unwrap();
  assert_eq!(tagged.get().unwrap().0, "premium");

  // Premium is not repeatable.
  let err = premium.select(&[Qualifier::new("Premium")]).unwrap_err();
  assert!(err.is_illegal_argument());
}

#[test]
fn container_without_config_rejects_custom_qualifiers() {
  let container = Container::new();
  struct Ledger;
  let err = container
    .bean(|_| Ledger)
    .qualified(Qualifier::new("Premium"))
    .register()
    .unwrap_err();
  assert!(err.is_illegal_argument());
}

#[test]
#[serial]
fn find_config_file_prefers_environment_specific_file() {
  env::remove_var("FIBRE_ENV");
  env::remove_var("APP_ENV");
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("fibre_inject.yaml"), YAML).unwrap();
  fs::write(dir.path().join("fibre_inject.staging.yaml"), "name: staging\n").unwrap();

  let default = find_config_file_in(dir.path(), None).unwrap();
  assert_eq!(default, dir.path().join("fibre_inject.yaml"));

  let explicit = find_config_file_in(dir.path(), Some("staging")).unwrap();
  assert_eq!(explicit, dir.path().join("fibre_inject.staging.yaml"));

  env::set_var("FIBRE_ENV", "staging");
  let from_env = find_config_file_in(dir.path(), None).unwrap();
  env::remove_var("FIBRE_ENV");
  assert_eq!(from_env, dir.path().join("fibre_inject.staging.yaml"));
  assert_eq!(ContainerConfig::from_file(&from_env).unwrap().name, "staging");
}

#[test]
#[serial]
fn find_config_file_not_found() {
  env::remove_var("FIBRE_ENV");
  env::remove_var("APP_ENV");
  let dir = tempfile::tempdir().unwrap();
  let result = find_config_file_in(dir.path(), Some("prod"));
  assert!(matches!(result, Err(Error::ConfigNotFound(_))));
}
