use rf_project::schema::*;
use rf_project::{Format, LATEST_VERSION, load, parse, render, save, validate_project};

fn loop_project() -> Project {
    Project {
        version: LATEST_VERSION,
        name: "Loop".to_string(),
        settings: SettingsDef::default(),
        chemicals: vec![ChemicalDef {
            id: "Water".to_string(),
            molar_mass: 18.015,
        }],
        streams: vec![
            StreamDef {
                id: "feed".to_string(),
                feed: Some(FeedDef {
                    flows: vec![("Water".to_string(), 100.0)],
                    temperature_k: 298.15,
                    pressure_pa: 101_325.0,
                    phase: PhaseDef::Liquid,
                }),
                price: Some(0.01),
            },
            StreamDef {
                id: "mixed".to_string(),
                feed: None,
                price: None,
            },
            StreamDef {
                id: "product".to_string(),
                feed: None,
                price: None,
            },
            StreamDef {
                id: "recycle".to_string(),
                feed: None,
                price: None,
            },
        ],
        units: vec![
            UnitDef {
                id: "M1".to_string(),
                kind: UnitKindDef::Mixer,
                ins: vec!["feed".to_string(), "recycle".to_string()],
                outs: vec!["mixed".to_string()],
                specification: None,
                tags: vec![],
            },
            UnitDef {
                id: "S1".to_string(),
                kind: UnitKindDef::Splitter { split: 0.5 },
                ins: vec!["mixed".to_string()],
                outs: vec!["product".to_string(), "recycle".to_string()],
                specification: None,
                tags: vec!["separation".to_string()],
            },
        ],
        systems: vec![SystemDef {
            id: "loop".to_string(),
            path: vec![
                ElementDef::Unit("M1".to_string()),
                ElementDef::Unit("S1".to_string()),
            ],
            recycles: vec!["recycle".to_string()],
            facilities: vec![],
            facility_recycle: None,
            convergence: Some(ConvergenceDef {
                method: MethodDef::Aitken,
                ..ConvergenceDef::default()
            }),
        }],
        groups: vec![],
    }
}

#[test]
fn roundtrip_yaml_loop_project() {
    let project = loop_project();
    validate_project(&project).unwrap();

    let path = std::env::temp_dir().join("rf_project_roundtrip_loop.yaml");
    save(&path, &project).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_loop_project() {
    let project = loop_project();
    let path = std::env::temp_dir().join("rf_project_roundtrip_loop.json");
    save(&path, &project).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn json_text_is_json() {
    let project = loop_project();
    let text = render(&project, Format::Json).unwrap();
    assert!(text.trim_start().starts_with('{'));
    assert_eq!(parse(&text, Format::Json).unwrap(), project);
    assert_eq!(Format::from_path(std::path::Path::new("a/b.JSON")), Format::Json);
    assert_eq!(Format::from_path(std::path::Path::new("a/b.yml")), Format::Yaml);
}

#[test]
fn omitted_fields_take_defaults() {
    let yaml = r#"
version: 1
name: Defaults
chemicals:
  - { id: Water, molar_mass: 18.015 }
streams:
  - id: feed
    feed:
      flows: [[Water, 5.0]]
  - { id: out }
units:
  - id: P1
    kind: { type: PassThrough }
    ins: [feed]
    outs: [out]
    specification:
      type: Search
      variable: { type: FeedFlow, stream: feed }
      measurement: { type: TotalFlow, stream: out }
      target: 10.0
      method: { type: Bracketed, lower: 1.0, upper: 20.0 }
systems:
  - id: main
    path: [{ type: Unit, id: P1 }]
"#;
    let project = rf_project::from_yaml_str(yaml).unwrap();
    assert_eq!(project.settings, SettingsDef::default());
    assert_eq!(project.settings.convergence.max_iterations, 200);

    let feed = project.stream("feed").unwrap().feed.as_ref().unwrap();
    assert_eq!(feed.temperature_k, 298.15);
    assert_eq!(feed.pressure_pa, 101_325.0);

    let Some(SpecificationDef::Search(search)) = &project.unit("P1").unwrap().specification else {
        panic!("expected a search specification");
    };
    assert!(search.enabled);
    assert_eq!(search.max_iterations, 50);
    assert_eq!(search.on_failure, None);
    assert_eq!(
        search.method,
        SearchMethodDef::Bracketed {
            lower: 1.0,
            upper: 20.0,
            check_bounds: true
        }
    );
}
